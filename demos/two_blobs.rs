use modalclust::cluster::{Aggregation, Distribution, Mac};
use modalclust::metrics::match_modes;
use modalclust::Dataset;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two tight groups in 2D plus a looser third one, clustered twice:
    // once on a single worker, once on four workers with per-worker merging.
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for i in 0..20 {
        let t = i as f64 / 20.0;
        rows.push(vec![0.2 * t.cos(), 0.2 * t.sin()]);
        rows.push(vec![6.0 + 0.2 * t.sin(), 6.0 - 0.2 * t.cos()]);
        rows.push(vec![-5.0 + 0.6 * t, 4.0 + 0.3 * (3.0 * t).sin()]);
    }
    let dataset = Dataset::new(&rows)?;

    let serial = Mac::new(0.8).with_parallelism(1).fit(&dataset)?;
    let parallel = Mac::new(0.8)
        .with_parallelism(4)
        .with_distribution(Distribution::StaticShard)
        .with_aggregation(Aggregation::PerWorker)
        .fit(&dataset)?;

    println!("points={} clusters={}", dataset.len(), serial.len());
    for (i, cluster) in serial.clusters().iter().enumerate() {
        let mode: Vec<String> = cluster.mode().iter().map(|x| format!("{x:.3}")).collect();
        println!("  cluster {}: size={} mode=({})", i, cluster.size(), mode.join(", "));
    }

    let matching = match_modes(&serial, &parallel, serial.mode_threshold());
    println!(
        "serial vs 4 workers: {} matched, complete={}",
        matching.matched.len(),
        matching.is_complete()
    );

    Ok(())
}
