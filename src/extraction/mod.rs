mod dates;

pub use dates::parse_due_date;

use chrono::NaiveDate;

use crate::task::Task;

/// Splits a free-form message into task items on the literal conjunction
/// « и », attaching a due date when one of the date keywords or a `dd.mm`
/// pattern is present. Keyword/regex matching only, no NLU.
pub fn extract_tasks(text: &str, today: NaiveDate) -> Vec<Task> {
    text.split(" и ")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let due_date = parse_due_date(part, today);
            let title = capitalize(&strip_date_keywords(part));
            if title.is_empty() {
                None
            } else {
                Some(Task { title, due_date })
            }
        })
        .collect()
}

fn strip_date_keywords(part: &str) -> String {
    let mut cleaned = part.to_owned();
    for (keyword, _) in dates::DATE_KEYWORDS {
        cleaned = cleaned.replace(keyword, "");
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn single_task_without_date() {
        let tasks = extract_tasks("купить хлеб", today());
        assert_eq!(
            tasks,
            vec![Task {
                title: "Купить хлеб".to_owned(),
                due_date: None,
            }]
        );
    }

    #[test]
    fn conjunction_splits_into_separate_tasks() {
        let tasks = extract_tasks("купить хлеб и позвонить маме завтра", today());
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "Купить хлеб");
        assert_eq!(tasks[0].due_date, None);
        assert_eq!(tasks[1].title, "Позвонить маме");
        assert_eq!(tasks[1].due_date, NaiveDate::from_ymd_opt(2024, 1, 11));
    }

    #[test]
    fn date_keyword_is_stripped_from_the_title() {
        let tasks = extract_tasks("послезавтра сдать отчёт", today());
        assert_eq!(tasks[0].title, "Сдать отчёт");
        assert_eq!(tasks[0].due_date, NaiveDate::from_ymd_opt(2024, 1, 12));
    }

    #[test]
    fn empty_and_whitespace_parts_are_dropped() {
        assert!(extract_tasks("  ", today()).is_empty());
        assert_eq!(extract_tasks("хлеб и  и молоко", today()).len(), 2);
    }
}
