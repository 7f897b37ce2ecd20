//! Portuguese month names as used by the report endpoints and file names.

pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// `"Março"` -> 3. Unknown names fall back to January.
pub fn month_number(name: &str) -> u32 {
    MONTH_NAMES
        .iter()
        .position(|m| *m == name.trim())
        .map(|i| i as u32 + 1)
        .unwrap_or(1)
}

/// Display name for 1..=12.
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

/// Lower-case name used in monthly report file names (`março`).
pub fn month_slug(month: u32) -> Option<String> {
    month_name(month).map(str::to_lowercase)
}
