//! Status, statistics, and insight command implementations

use anyhow::Result;

use warroom_core::{aggregate, insights, GroupSizeBucket, PersonaResponder};

use super::load_dataset;

pub async fn cmd_status(source: &str) -> Result<()> {
    println!();
    println!("🚁 Austin Mobility War Room");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Source: {}", source);

    if source == "sample" {
        println!("   ℹ️  Using the embedded sample (set WARROOM_DATA_URL for live data)");
    }

    match load_dataset(source).await {
        Ok(dataset) => {
            println!();
            println!("   Trips: {}", dataset.len());
            println!("   Skipped rows: {}", dataset.skipped);

            let responder = PersonaResponder::from_env();
            if responder.backend_label() == "template" {
                println!("   Text generation: templates (set OPENAI_API_KEY to enable generation)");
            } else if responder.backend_healthy().await {
                println!(
                    "   Text generation: ✅ {} at {}",
                    responder.backend_label(),
                    responder.backend_host()
                );
            } else {
                println!(
                    "   Text generation: ⚠️  {} not responding at {}",
                    responder.backend_label(),
                    responder.backend_host()
                );
            }
        }
        Err(e) => {
            println!();
            println!("   ❌ Error loading dataset: {}", e);
        }
    }

    println!();
    Ok(())
}

pub async fn cmd_stats(source: &str, top: usize) -> Result<()> {
    let dataset = load_dataset(source).await?;
    let agg = aggregate(&dataset);

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│       📊 Austin Trip Statistics         │");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Trips:            {}", agg.total_trips);
    println!("  Riders moved:     {}", agg.total_passengers);
    println!("  Avg group size:   {:.1}", agg.avg_group_size);
    match agg.peak_hour {
        Some(hour) => println!(
            "  Peak hour:        {}:00 ({} trips)",
            hour,
            agg.peak_hour_count()
        ),
        None => println!("  Peak hour:        (no data)"),
    }

    println!();
    println!("  Trips by hour:");
    for (hour, &count) in agg.hourly.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let bar = "█".repeat(count.min(40) as usize);
        println!("    {:>2}:00 {:>4} {}", hour, count, bar);
    }

    println!();
    println!("  Group sizes:");
    for bucket in GroupSizeBucket::all() {
        println!(
            "    {:>4} riders: {}",
            bucket.label(),
            agg.group_sizes[bucket.index()]
        );
    }

    println!();
    println!("  🔥 Top pickup spots:");
    for (i, (name, count)) in agg.top_pickups(top).into_iter().enumerate() {
        println!("    {}. {} ({} trips)", i + 1, name, count);
    }

    println!();
    println!("  🗺️  Top zones:");
    for (i, (name, count)) in agg.top_zones(top).into_iter().enumerate() {
        println!("    {}. {} ({} pickups)", i + 1, name, count);
    }

    println!();
    Ok(())
}

pub async fn cmd_insights(source: &str) -> Result<()> {
    let dataset = load_dataset(source).await?;
    let agg = aggregate(&dataset);

    println!();
    println!("💡 Insights ({} trips from {})", dataset.len(), dataset.source);
    println!();
    for insight in insights::summarize(&agg) {
        println!("   • {}", insight);
    }
    println!();
    Ok(())
}
