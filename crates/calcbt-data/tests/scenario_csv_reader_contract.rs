use calcbt_data::{CsvBarReader, CsvColumns, DataReader, ReaderError};

const FMT: &str = "%Y-%m-%d %H:%M:%S";

/// End-to-end exercise of the `DataReader` contract through its one
/// concrete implementation: case-insensitive headers, in-order row
/// parsing, and a fatal error on a malformed row rather than silent repair.
#[test]
fn csv_reader_satisfies_the_data_reader_contract() {
    let csv = "Datetime,Open,High,Low,Close,Volume\n\
               2024-01-01 00:00:00,10,12,9,11,100\n\
               2024-01-02 00:00:00,11,13,10,12,100\n";
    let mut reader = CsvBarReader::from_str("t.csv", csv, &CsvColumns::default(), FMT).unwrap();

    let first = reader.peek().unwrap().clone();
    assert_eq!(reader.peek().unwrap().datetime, first.datetime, "peek must not advance the cursor");

    let popped = reader.pop_first().unwrap();
    assert_eq!(popped.datetime, first.datetime);
    assert!(reader.peek().is_some());

    reader.pop_first();
    assert!(reader.peek().is_none());
}

#[test]
fn malformed_row_is_fatal_not_repaired() {
    let csv = "datetime,open,high,low,close,volume\n2024-01-01 00:00:00,not-a-number,12,9,11,100\n";
    let err = CsvBarReader::from_str("t.csv", csv, &CsvColumns::default(), FMT).unwrap_err();
    assert!(matches!(err, ReaderError::MalformedRow { .. }));
}
