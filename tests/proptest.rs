use genomos::{
    Record, Status, count,
    table::Reader,
};
use proptest::prelude::*;

fn status_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::from("S")),
        Just(String::from("H")),
        Just(String::from("R")),
        Just(String::from("s")),
        Just(String::from("h")),
        Just(String::from("r")),
        Just(String::from(" Sensible ")),
        Just(String::from("HETEROCIGOTO")),
        Just(String::from("Resistente")),
        Just(String::new()),
        Just(String::from("X")),
        "[a-zA-Z]{0,4}",
    ]
}

fn records(cells: Vec<String>) -> Vec<Record> {
    cells
        .into_iter()
        .enumerate()
        .map(|(index, status)| Record {
            id: (index + 1).to_string(),
            status: Some(status),
        })
        .collect()
}

proptest! {
    #[test]
    fn bucket_counts_always_sum_to_total(cells in prop::collection::vec(status_cell(), 0..200)) {
        let rows = cells.len() as u64;
        let tally = count(records(cells));
        prop_assert_eq!(
            tally.sensible + tally.heterocigoto + tally.resistente + tally.unrecognized,
            rows
        );
        prop_assert_eq!(tally.total(), rows);
    }
}

proptest! {
    #[test]
    fn tally_is_order_independent(
        (cells, shuffled) in prop::collection::vec(status_cell(), 0..100)
            .prop_flat_map(|cells| {
                let unshuffled = cells.clone();
                (Just(unshuffled), Just(cells).prop_shuffle())
            })
    ) {
        prop_assert_eq!(count(records(cells)), count(records(shuffled)));
    }
}

proptest! {
    #[test]
    fn normalization_is_idempotent(cell in status_cell()) {
        match Status::parse(&cell) {
            Some(status) => {
                // Re-parsing the canonical code and name lands on the same state.
                prop_assert_eq!(Status::parse(&status.code().to_string()), Some(status));
                prop_assert_eq!(Status::parse(status.name()), Some(status));
            }
            None => {
                // Trimming does not change the verdict.
                prop_assert_eq!(Status::parse(cell.trim()), None);
            }
        }
    }
}

proptest! {
    #[test]
    fn reader_handles_arbitrary_input(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        if let Ok(reader) = Reader::new(data.as_slice(), b',') {
            for row in reader {
                let _ = row;
            }
        }
    }
}
