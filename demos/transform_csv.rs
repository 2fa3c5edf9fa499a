use property_ingest::{export_csv, transform_file, PortfolioSummary};
use std::error::Error;
use std::fs;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .ok_or("usage: transform_csv <input.csv> [output.csv]")?;
    let output = args
        .next()
        .unwrap_or_else(|| "transformed_properties.csv".to_string());

    println!("📥 Reading {}...\n", input);
    let batch = transform_file(&input)?;

    println!("{}\n", batch.summary);

    let portfolio = PortfolioSummary::from_properties(&batch.properties, 3);
    println!("📊 Portfolio");
    println!("  Properties: {}", portfolio.property_count);
    println!("  Total value: ${:.0}", portfolio.total_value);
    println!("  Average ROI: {:.2}%", portfolio.average_roi);
    println!("  Total monthly cash flow: ${:.0}", portfolio.total_cash_flow);
    println!("  Top by ROI: {}", portfolio.top_roi.join(", "));

    fs::write(&output, export_csv(&batch.properties)?)?;
    println!("\n✅ Wrote {} records to {}", batch.rows_out(), output);

    Ok(())
}
