//! Print the header of an IDX file and one of its records

use std::env;

use idx_prep::dataset::{IdxFile, Record};
use idx_prep::utils::DatasetError;

fn open_any(path: &str) -> Result<IdxFile, DatasetError> {
    match IdxFile::open_images(path) {
        Err(DatasetError::BadMagicNumber { .. }) => IdxFile::open_labels(path),
        other => other,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <idx-file> [record]", args[0]);
        std::process::exit(1);
    }

    let index: u32 = match args.get(2) {
        Some(s) => s.parse()?,
        None => 0,
    };

    let idx = open_any(&args[1])?;
    println!("{}", idx.summary());
    if idx.trailing_bytes() > 0 {
        println!("Trailing bytes: {}", idx.trailing_bytes());
    }

    if idx.item_count() == 0 {
        return Ok(());
    }

    match idx.record(index)? {
        Record::Label(value) => println!("Record {}: label {}", index, value),
        record @ Record::Image { rows, cols, .. } => {
            println!("Record {}: {}x{} image", index, rows, cols);
            for r in 0..rows {
                if let Some(row) = record.row(r) {
                    let line: Vec<String> = row.iter().map(|p| format!("{:3}", p)).collect();
                    println!("{}", line.join(" "));
                }
            }
        }
    }

    Ok(())
}
