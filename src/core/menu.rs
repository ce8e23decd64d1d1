use crate::domain::calendar;
use crate::domain::model::{MenuDate, MenuDay};

/// Where the day blocks live on the page and how a day's dish is delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLayout {
    pub container_class: String,
    pub block_class: String,
    pub day_separator: String,
    pub start_marker: String,
    pub end_marker: String,
}

impl Default for MenuLayout {
    fn default() -> Self {
        Self {
            container_class: "block".to_string(),
            block_class: "divider".to_string(),
            day_separator: "–".to_string(),
            start_marker: "Mittag".to_string(),
            end_marker: "Dessert".to_string(),
        }
    }
}

fn remove_all_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 以分隔符切成每日區塊，去除空白後丟棄空字串
pub fn split_day_chunks(text: &str, separator: &str) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}

/// Text strictly between the first `start` and the first `end` marker,
/// trimmed of whitespace and colons. `None` when a marker is missing, the
/// markers are out of order, or nothing is left after trimming.
pub fn extract_between(text: &str, start: &str, end: &str) -> Option<String> {
    let start_idx = text.find(start)?;
    let end_idx = text.find(end)?;
    let content_start = start_idx + start.len();
    if end_idx <= start_idx || end_idx < content_start {
        return None;
    }

    let section = text[content_start..end_idx]
        .trim_matches(|c: char| c.is_whitespace() || c == ':')
        .to_string();
    (!section.is_empty()).then_some(section)
}

/// 日期必須是完整的數字，"2" 不能配到 "23"；"02" 可以
fn mentions_day(text: &str, day: u32) -> bool {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .any(|run| run.parse::<u32>().is_ok_and(|n| n == day))
}

/// Whitespace-insensitive: the chunk must mention the weekday (German or
/// English), the day of month as a whole number and the German month name.
pub fn chunk_matches_date(chunk: &str, date: &MenuDate) -> bool {
    let stripped = remove_all_whitespace(chunk);
    (stripped.contains(date.weekday_de) || stripped.contains(date.weekday_en))
        && mentions_day(&stripped, date.day)
        && stripped.contains(date.month_de)
}

/// 標題區塊：同時含有星期與月份名稱
fn is_date_header(chunk: &str) -> bool {
    let stripped = remove_all_whitespace(chunk);
    calendar::all_weekday_names().any(|w| stripped.contains(w))
        && calendar::all_month_names().any(|m| stripped.contains(m))
}

/// Picks the day block for `date` out of the selected element texts.
///
/// A matching chunk is joined with the chunks that follow it until the next
/// date header, so both "date – menu" and "date menu – next date" layouts
/// resolve to the same block.
pub fn find_menu_day(texts: &[String], date: &MenuDate, layout: &MenuLayout) -> Option<MenuDay> {
    for text in texts {
        let chunks = split_day_chunks(text, &layout.day_separator);

        for (idx, chunk) in chunks.iter().enumerate() {
            if !chunk_matches_date(chunk, date) {
                continue;
            }

            let mut block = chunk.clone();
            for next in chunks.iter().skip(idx + 1) {
                if is_date_header(next) {
                    break;
                }
                block.push(' ');
                block.push_str(next);
            }

            tracing::debug!("📅 Matched day block for {}: {}", date.label(), block);

            match extract_between(&block, &layout.start_marker, &layout.end_marker) {
                Some(lunch) => {
                    return Some(MenuDay {
                        label: date.label(),
                        block,
                        lunch,
                    })
                }
                None => tracing::debug!(
                    "📅 Block for {} has no '{}' … '{}' section",
                    date.label(),
                    layout.start_marker,
                    layout.end_marker
                ),
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn thursday_july_20() -> MenuDate {
        MenuDate::from_date(NaiveDate::from_ymd_opt(2023, 7, 20).unwrap())
    }

    #[test]
    fn test_split_day_chunks_drops_empty_entries() {
        let text = " Montag, 17. Juli Mittag: A Dessert: B – Dienstag, 18. Juli Mittag: C Dessert: D –  – Mittwoch, 19. Juli Mittag: E Dessert: F – ";
        let chunks = split_day_chunks(text, "–");

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| !c.is_empty() && c.trim() == c));
        assert!(chunks[1].starts_with("Dienstag"));
    }

    #[test]
    fn test_extract_between_markers() {
        assert_eq!(
            extract_between("Mittag  Bò Kho  Dessert Obst", "Mittag", "Dessert"),
            Some("Bò Kho".to_string())
        );
        assert_eq!(
            extract_between("Mittag: Bò Kho Dessert: Obst", "Mittag", "Dessert"),
            Some("Bò Kho".to_string())
        );
    }

    #[test]
    fn test_extract_between_missing_or_reversed() {
        assert_eq!(extract_between("Mittag: Suppe", "Mittag", "Dessert"), None);
        assert_eq!(extract_between("Suppe Dessert: Obst", "Mittag", "Dessert"), None);
        assert_eq!(extract_between("Dessert: Obst Mittag: Suppe", "Mittag", "Dessert"), None);
        assert_eq!(extract_between("Mittag Dessert", "Mittag", "Dessert"), None);
    }

    #[test]
    fn test_chunk_matches_all_date_parts() {
        let date = thursday_july_20();

        assert!(chunk_matches_date("Donnerstag, 20. Juli", &date));
        assert!(chunk_matches_date("Donners tag,\n20.\tJuli", &date));
        assert!(chunk_matches_date("Thursday 20. Juli", &date));

        assert!(!chunk_matches_date("Mittwoch, 20. Juli", &date));
        assert!(!chunk_matches_date("Donnerstag, 21. Juli", &date));
        assert!(!chunk_matches_date("Donnerstag, 20. August", &date));
    }

    #[test]
    fn test_day_must_be_whole_number() {
        // 2026-07-02 是星期四
        let date = MenuDate::from_date(NaiveDate::from_ymd_opt(2026, 7, 2).unwrap());

        assert!(!chunk_matches_date("Donnerstag, 23. Juli", &date));
        assert!(!chunk_matches_date("Donnerstag, 12. Juli", &date));
        assert!(chunk_matches_date("Donnerstag, 2. Juli", &date));
        assert!(chunk_matches_date("Donnerstag, 02. Juli 2026", &date));
    }

    #[test]
    fn test_find_menu_day_skips_later_day_with_same_digit() {
        let date = MenuDate::from_date(NaiveDate::from_ymd_opt(2026, 7, 2).unwrap());
        let texts = vec![
            "Donnerstag, 23. Juli – Mittag: Falscher Tag Dessert: Obst – Donnerstag, 2. Juli – Mittag: Spätzle Dessert: Eis"
                .to_string(),
        ];

        let day = find_menu_day(&texts, &date, &MenuLayout::default()).unwrap();
        assert_eq!(day.lunch, "Spätzle");

        let only_later = vec!["Donnerstag, 23. Juli – Mittag: Falscher Tag Dessert: Obst".to_string()];
        assert!(find_menu_day(&only_later, &date, &MenuLayout::default()).is_none());
    }

    #[test]
    fn test_find_menu_day_header_and_menu_split() {
        let texts = vec!["Donnerstag, 20. Juli – Mittag: Bò Kho Dessert: Obst".to_string()];
        let day = find_menu_day(&texts, &thursday_july_20(), &MenuLayout::default()).unwrap();

        assert_eq!(day.lunch, "Bò Kho");
        assert_eq!(day.label, "Donnerstag, 20. Juli");
    }

    #[test]
    fn test_find_menu_day_picks_correct_day() {
        let texts = vec![
            "Mittwoch, 19. Juli Mittag: Linsensuppe Dessert: Pudding – Donnerstag, 20. Juli Mittag: Gulasch Dessert: Eis – Freitag, 21. Juli Mittag: Fisch Dessert: Obst".to_string(),
        ];
        let day = find_menu_day(&texts, &thursday_july_20(), &MenuLayout::default()).unwrap();
        assert_eq!(day.lunch, "Gulasch");
    }

    #[test]
    fn test_find_menu_day_does_not_bleed_into_next_day() {
        // 當天沒有 Dessert，不能借用隔天的
        let texts = vec![
            "Donnerstag, 20. Juli – Mittag: Gulasch – Freitag, 21. Juli – Mittag: Fisch Dessert: Obst".to_string(),
        ];
        assert!(find_menu_day(&texts, &thursday_july_20(), &MenuLayout::default()).is_none());
    }

    #[test]
    fn test_find_menu_day_not_found() {
        let texts = vec!["Montag, 17. Juli Mittag: Suppe Dessert: Obst".to_string()];
        assert!(find_menu_day(&texts, &thursday_july_20(), &MenuLayout::default()).is_none());
    }
}
