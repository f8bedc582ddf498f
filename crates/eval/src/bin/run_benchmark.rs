use anyhow::Result;
use clap::Parser;
use eval::{BenchmarkReport, Benchmarker, get_test_set, upload_image};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "run_benchmark", about = "Measure how well model responses are turned into fields")]
struct Args {
    /// Where the JSON report is written
    #[arg(long, default_value = "extraction_benchmark.json")]
    output: PathBuf,

    /// Parses per fixture used for the timing figures
    #[arg(long, default_value_t = 200)]
    iterations: usize,

    /// Send this image to a running server instead of running the benchmark
    #[arg(long)]
    upload: Option<PathBuf>,

    #[arg(long, default_value = "http://localhost:9090")]
    api_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(image) = args.upload {
        println!("Uploading {} to {}", image.display(), args.api_url);
        let result = upload_image(&args.api_url, &image).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("=== Field Extraction Benchmark ===\n");

    let test_set = get_test_set();
    println!("Test set: {} responses\n", test_set.len());

    let report = Benchmarker::new(args.iterations).run(&test_set);
    print_report(&report);

    std::fs::write(&args.output, serde_json::to_string_pretty(&report)?)?;
    println!("\nResults saved to {}", args.output.display());

    Ok(())
}

fn print_report(report: &BenchmarkReport) {
    println!("Field accuracy:");
    println!("  Disease name:     {:.0}%", report.fields.disease_name * 100.0);
    println!("  Disease ICD code: {:.0}%", report.fields.disease_icd_code * 100.0);
    println!("  Medicine name:    {:.0}%", report.fields.medicine_name * 100.0);
    println!("  Overall:          {:.0}%", report.fields.overall * 100.0);

    println!("\nBy category:");
    for score in &report.by_category {
        println!(
            "  {:<12} n={:<3} overall {:.0}%",
            score.category,
            score.count,
            score.accuracy.overall * 100.0
        );
    }

    println!("\nParse time ({} iterations per response):", report.parse_time.iterations);
    println!("  Mean: {:.1} us", report.parse_time.mean_us);
    println!("  P50:  {:.1} us", report.parse_time.p50_us);
    println!("  P95:  {:.1} us", report.parse_time.p95_us);

    if !report.misses.is_empty() {
        println!("\nMisses:");
        for miss in &report.misses {
            println!(
                "  {} / {}: expected {:?}, got {:?}",
                miss.fixture, miss.field, miss.expected, miss.actual
            );
        }
    }
}
