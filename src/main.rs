// Command-line stand-in for the GUI caller: load the customer CSV, append
// one record and report where it lands.
use std::error::Error;

use segmenta::{CustomerRecord, Dataset, SegmentationEngine};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "Mall_Customers.csv".to_string());
    let age = args.next().unwrap_or_else(|| "25".to_string());
    let income = args.next().unwrap_or_else(|| "50".to_string());
    let score = args.next().unwrap_or_else(|| "50".to_string());
    let gender = args.next();

    let dataset = Dataset::load(&path)?;
    let record = CustomerRecord::parse(gender.as_deref(), &age, &income, &score)?;

    let engine = SegmentationEngine::new();
    let segmentation = engine.segment(&dataset, &record)?;

    println!("{} customer records loaded from {}", dataset.len(), path);
    for (cluster, size) in segmentation.cluster_sizes().iter().enumerate() {
        println!("Cluster {}: {} customers", cluster, size);
    }
    println!(
        "New customer (age {}, income {}k$, score {}) falls in cluster {}",
        record.age,
        record.annual_income,
        record.spending_score,
        segmentation.new_record_cluster()
    );

    Ok(())
}
