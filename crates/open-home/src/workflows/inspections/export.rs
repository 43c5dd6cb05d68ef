use std::io::Write;

use super::competition::TimeSlot;

/// Write the slot table as CSV: one row per slot with its member addresses
/// joined by `"; "`.
pub fn write_slots_csv<W: Write>(writer: W, slots: &[TimeSlot]) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["time", "count", "competition", "addresses"])?;

    for slot in slots {
        let addresses = slot
            .properties
            .iter()
            .map(|record| record.address.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let count = slot.count.to_string();
        csv.write_record([
            slot.time.as_str(),
            count.as_str(),
            slot.competition.label(),
            addresses.as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}
