use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

pub const MAX_AGE_YEARS: u8 = 120;

fn is_decimal_digit(ch: char) -> bool {
    ch.is_ascii_digit() || ch.general_category() == GeneralCategory::DecimalNumber
}

/// Digit-like characters join a run. Only decimal digits give it a value:
/// superscripts or circled digits make the whole run unreadable.
fn is_digit_like(ch: char) -> bool {
    is_decimal_digit(ch) || ch.general_category() == GeneralCategory::OtherNumber
}

/// Value of a decimal digit in any script.
///
/// `Nd` code points always come in complete, ascending 0..=9 sets, so the
/// value is the offset from the start of the contiguous `Nd` stretch,
/// modulo ten.
fn decimal_value(ch: char) -> Option<u32> {
    if let Some(value) = ch.to_digit(10) {
        return Some(value);
    }
    if !is_decimal_digit(ch) {
        return None;
    }

    let code = ch as u32;
    let offset = (1..=code)
        .map_while(|back| char::from_u32(code - back))
        .take_while(|prev| is_decimal_digit(*prev))
        .count() as u32;
    Some(offset % 10)
}

/// Takes the first run of digits anywhere in the text and returns it when it
/// is a plausible age (0..=120).
///
/// Deliberately crude: digits inside a phone number or a date count too, and
/// a run that is out of range or unreadable yields `None` rather than trying
/// the next run.
pub fn extract_age(text: &str) -> Option<u8> {
    let mut run = text
        .chars()
        .skip_while(|ch| !is_digit_like(*ch))
        .take_while(|ch| is_digit_like(*ch))
        .peekable();

    run.peek()?;

    let value = run.try_fold(0_u32, |acc, ch| {
        acc.checked_mul(10)?.checked_add(decimal_value(ch)?)
    })?;

    u8::try_from(value)
        .ok()
        .filter(|age| *age <= MAX_AGE_YEARS)
}
