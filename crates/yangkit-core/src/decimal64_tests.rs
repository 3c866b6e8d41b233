use std::collections::HashSet;

use crate::{Decimal64, Decimal64Error, RoundingMode};

#[track_caller]
fn dec(s: &str) -> Decimal64 {
    s.parse().unwrap()
}

#[track_caller]
fn parse_err(s: &str) -> String {
    s.parse::<Decimal64>().unwrap_err().to_string()
}

#[test]
fn parse_canonical_forms() {
    insta::assert_snapshot!(dec("1"), @"1.0");
    insta::assert_snapshot!(dec("+007.250"), @"7.25");
    insta::assert_snapshot!(dec("-0.5"), @"-0.5");
    insta::assert_snapshot!(dec("-0.0"), @"0.0");
    insta::assert_snapshot!(dec("0.000001"), @"0.000001");
    insta::assert_snapshot!(dec("-922337203685477580.7"), @"-922337203685477580.7");
}

#[test]
fn parse_scale_follows_fraction_digits() {
    assert_eq!(dec("1").scale(), 1);
    assert_eq!(dec("1.50").scale(), 1);
    assert_eq!(dec("1.05").scale(), 2);
    assert_eq!(dec("0.635").unscaled_value(), 635);
}

#[test]
fn parse_errors() {
    insta::assert_snapshot!(parse_err(""), @"empty string is not a valid decimal64 representation");
    insta::assert_snapshot!(parse_err("-"), @"Missing digits after sign");
    insta::assert_snapshot!(parse_err("0."), @"Value '0.' is missing fraction digits");
    insta::assert_snapshot!(parse_err("1234567890123456789"), @"Integer part is longer than 18 digits");
    insta::assert_snapshot!(parse_err("922337203685477580.71"), @"Fraction part longer than 1 digits");
    insta::assert_snapshot!(parse_err("1.2x"), @"Illegal character at offset 3");
}

#[test]
fn equality_is_scale_normalized() {
    let a = Decimal64::new(1, 15).unwrap();
    let b = Decimal64::new(3, 1500).unwrap();
    assert_eq!(a, b);

    let set: HashSet<Decimal64> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);

    assert!(dec("1.49") < dec("1.5"));
    assert!(dec("-2") < dec("-1.99"));
}

#[test]
fn scale_up_then_down_round_trips() {
    let original = dec("12.34");
    let wide = original.scale_to(10, RoundingMode::Unnecessary).unwrap();
    assert_eq!(wide.unscaled_value(), 123_400_000_000);

    let back = wide.scale_to(2, RoundingMode::Unnecessary).unwrap();
    assert_eq!(back, original);
    assert_eq!(back.to_string(), original.to_string());
    assert_eq!(back.scale(), 2);
}

#[test]
fn scale_down_with_remainder_requires_rounding() {
    let err = dec("0.635")
        .scale_to(2, RoundingMode::Unnecessary)
        .unwrap_err();
    assert!(matches!(err, Decimal64Error::RequiresRounding { scale: 2, .. }));
    insta::assert_snapshot!(err, @"Decimal64 0.635 requires rounding to scale 2");
}

#[test]
fn rounding_modes_on_boundary_value() {
    let value = dec("0.635");
    let round = |mode| value.scale_to(2, mode).unwrap().to_string();

    assert_eq!(round(RoundingMode::Up), "0.64");
    assert_eq!(round(RoundingMode::Down), "0.63");
    assert_eq!(round(RoundingMode::Ceiling), "0.64");
    assert_eq!(round(RoundingMode::Floor), "0.63");
    assert_eq!(round(RoundingMode::HalfUp), "0.64");
    assert_eq!(round(RoundingMode::HalfDown), "0.63");
    assert_eq!(round(RoundingMode::HalfEven), "0.64");
}

#[test]
fn rounding_modes_on_negative_value() {
    let value = dec("-0.625");
    let round = |mode| value.scale_to(2, mode).unwrap().to_string();

    assert_eq!(round(RoundingMode::Up), "-0.63");
    assert_eq!(round(RoundingMode::Down), "-0.62");
    assert_eq!(round(RoundingMode::Ceiling), "-0.62");
    assert_eq!(round(RoundingMode::Floor), "-0.63");
    assert_eq!(round(RoundingMode::HalfUp), "-0.63");
    assert_eq!(round(RoundingMode::HalfDown), "-0.62");
    assert_eq!(round(RoundingMode::HalfEven), "-0.62");
}

#[test]
fn scale_up_overflow() {
    let err = Decimal64::max_value(1)
        .unwrap()
        .scale_to(2, RoundingMode::Unnecessary)
        .unwrap_err();
    assert!(matches!(err, Decimal64Error::Overflow { scale: 2, .. }));
}

#[test]
fn invalid_scale() {
    assert_eq!(Decimal64::new(0, 1), Err(Decimal64Error::InvalidScale(0)));
    assert_eq!(Decimal64::new(19, 1), Err(Decimal64Error::InvalidScale(19)));
}

#[test]
fn from_integer() {
    let seven = Decimal64::from_integer(2, 7).unwrap();
    assert_eq!(seven.unscaled_value(), 700);
    assert_eq!(seven.int_part(), 7);
    assert_eq!(seven.frac_part(), 0);
    assert!(Decimal64::from_integer(18, 100).is_err());
}
