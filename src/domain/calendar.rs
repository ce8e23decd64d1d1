use chrono::Weekday;

const WEEKDAYS_DE: [&str; 7] = [
    "Montag",
    "Dienstag",
    "Mittwoch",
    "Donnerstag",
    "Freitag",
    "Samstag",
    "Sonntag",
];

const WEEKDAYS_EN: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS_DE: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

pub fn german_weekday(weekday: Weekday) -> &'static str {
    WEEKDAYS_DE[weekday.num_days_from_monday() as usize]
}

pub fn english_weekday(weekday: Weekday) -> &'static str {
    WEEKDAYS_EN[weekday.num_days_from_monday() as usize]
}

/// `month` is 1-based, as returned by `chrono::Datelike::month`.
pub fn german_month(month: u32) -> &'static str {
    MONTHS_DE[(month.clamp(1, 12) - 1) as usize]
}

/// 所有星期名稱（德文與英文），用來辨識日期標題
pub fn all_weekday_names() -> impl Iterator<Item = &'static str> {
    WEEKDAYS_DE.iter().chain(WEEKDAYS_EN.iter()).copied()
}

pub fn all_month_names() -> impl Iterator<Item = &'static str> {
    MONTHS_DE.iter().copied()
}
