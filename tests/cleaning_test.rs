mod common;

use common::record;
use pumpwatch::cleaning::{TIME_TAG_COLUMN, TimeTagger, clean_dataset, clean_file};
use pumpwatch::config::Config;
use pumpwatch::store::{COLUMNS, Dataset, DedupStore};
use std::fs;

fn tagger() -> TimeTagger {
    TimeTagger::from_config(&Config::default().time_tags)
}

#[test]
fn keeps_first_row_per_station_tag_and_day_sorted_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gas_prices.csv");

    let mut unpriced = record("5", "2024-11-20 08:50:00");
    unpriced.regular_price = None;
    unpriced.premium_price = None;

    DedupStore::new(&path)
        .append(&[
            record("20", "2024-11-20 08:15:00"),
            record("20", "2024-11-20 09:30:00"),
            record("20", "2024-11-21 08:15:00"),
            record("3", "2024-11-20 13:00:00"),
            record("3", "2024-11-20 02:00:00"),
            unpriced,
        ])
        .unwrap();

    let cleaned = clean_dataset(&Dataset::load(&path).unwrap(), &tagger());
    let summary: Vec<(&str, &str, &str)> = cleaned
        .rows
        .iter()
        .map(|r| (r.station_id(), &r.row[4], r.time_tag.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("3", "2024-11-20 13:00:00", "afternoon"),
            ("3", "2024-11-20 02:00:00", "other"),
            ("20", "2024-11-20 08:15:00", "morning"),
            ("20", "2024-11-21 08:15:00", "morning"),
        ]
    );
}

#[test]
fn unparseable_query_time_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gas_prices.csv");
    let raw = format!(
        "{}\n1,S,A,,not a time,,150.5,,\n2,S,A,,2024-11-20 20:00:00,,150.5,,\n",
        COLUMNS.join(",")
    );
    fs::write(&path, raw).unwrap();

    let cleaned = clean_dataset(&Dataset::load(&path).unwrap(), &tagger());
    assert_eq!(cleaned.len(), 1);
    assert_eq!(cleaned.rows[0].station_id(), "2");
    assert_eq!(cleaned.rows[0].time_tag, "evening");
}

#[test]
fn clean_file_writes_time_tag_column_without_touching_source() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gas_prices.csv");
    let output = dir.path().join("cleaned").join("cleaned_gas_prices.csv");
    DedupStore::new(&input)
        .append(&[record("A", "2024-11-20 04:30:00")])
        .unwrap();
    let source_before = fs::read(&input).unwrap();

    let cleaned = clean_file(&input, &output, &tagger()).unwrap();
    assert_eq!(cleaned.len(), 1);
    assert_eq!(fs::read(&input).unwrap(), source_before);

    let contents = fs::read_to_string(&output).unwrap();
    let mut lines = contents.lines();
    let header = lines.next().unwrap();
    assert!(header.ends_with(&format!(",{}", TIME_TAG_COLUMN)));
    assert!(lines.next().unwrap().ends_with(",midnight"));
}
