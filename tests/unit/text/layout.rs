use super::*;

/// One pixel per character, for exact wrap expectations.
struct CharCount;

impl TextMeasure for CharCount {
    fn measure(&mut self, text: &str) -> ForgeResult<TextExtent> {
        Ok(TextExtent {
            width: text.chars().count() as f64,
            height: 1.0,
        })
    }
}

#[test]
fn builtin_metrics_scale_with_size() {
    let e = BuiltinMeasure::extent(24.0, "AB");
    assert_eq!(e.width, 2.0 * 18.0 - 3.0);
    assert_eq!(e.height, 21.0);
    assert_eq!(BuiltinMeasure::extent(24.0, ""), TextExtent::default());
    let big = BuiltinMeasure::extent(48.0, "AB");
    assert_eq!(big.width, e.width * 2.0);
}

#[test]
fn wraps_street_address_within_width() {
    let mut m = BuiltinMeasure { size_px: 24.0 };
    let text = "123 Long Street Name Avenue";
    let full = m.measure(text).unwrap().width;
    let max = 200.0;
    assert!(full > max);

    let lines = wrap_words(&mut m, text, max).unwrap();
    assert_eq!(lines.as_slice(), ["123 Long", "Street Name", "Avenue"]);
    for line in &lines {
        assert!(m.measure(line).unwrap().width <= max, "{line}");
    }
}

#[test]
fn overwide_word_stays_alone() {
    let lines = wrap_words(&mut CharCount, "a verylongword b c", 5.0).unwrap();
    assert_eq!(lines.as_slice(), ["a", "verylongword", "b c"]);

    let lines = wrap_words(&mut CharCount, "verylongword", 3.0).unwrap();
    assert_eq!(lines.as_slice(), ["verylongword"]);
}

#[test]
fn wrap_never_exceeds_width_except_single_words() {
    let text = "Plot 42, Sector 7, Near Old Bus Stand, Outer Ring Road, Bengaluru 560001";
    for max in [1.0, 6.0, 10.0, 17.0, 30.0, 200.0] {
        let lines = wrap_words(&mut CharCount, text, max).unwrap();
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text.split_whitespace().collect::<Vec<_>>().join(" "));
        for line in &lines {
            let w = line.chars().count() as f64;
            assert!(w <= max || !line.contains(' '), "max={max} line={line:?}");
        }
    }
}

#[test]
fn blank_text_yields_no_lines() {
    assert!(wrap_words(&mut CharCount, "   ", 10.0).unwrap().is_empty());
}

#[test]
fn stacked_lines_step_by_font_size_plus_gap() {
    let mut m = BuiltinMeasure { size_px: 24.0 };
    let lines = vec!["ONE".to_string(), "TWO".to_string(), "THREE".to_string()];
    let placed = stack_lines(&mut m, &lines, Point::new(10.0, 100.0), 24.0).unwrap();
    let ys: Vec<f64> = placed.iter().map(|l| l.origin.y).collect();
    assert_eq!(ys, vec![100.0, 129.0, 158.0]);
    assert!(placed.iter().all(|l| l.origin.x == 10.0));
    assert_eq!(placed[2].extent, BuiltinMeasure::extent(24.0, "THREE"));
    assert_eq!(line_height(30.0), 35.0);
}

#[test]
fn face_measure_uses_builtin_metrics_for_builtin_face() {
    let mut shaper = TextShaper::new();
    let font = ResolvedFont::builtin("Nope");
    let mut m = FaceMeasure {
        shaper: &mut shaper,
        font: &font,
        size_px: 16.0,
    };
    assert_eq!(
        m.measure("HELLO").unwrap(),
        BuiltinMeasure::extent(16.0, "HELLO")
    );
}
