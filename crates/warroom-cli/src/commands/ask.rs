//! Persona command implementations (ask, predict)

use anyhow::Result;

use warroom_core::{aggregate, pick_winner, PersonaResponder, ResponseSource};

use super::load_dataset;

pub async fn cmd_ask(source: &str, query: &str) -> Result<()> {
    let dataset = load_dataset(source).await?;
    let agg = aggregate(&dataset);
    let responder = PersonaResponder::from_env();

    println!();
    println!("⚔️  WAR ROOM: {}", query);
    println!();

    let turn = responder.respond_all(query, &agg).await;
    for response in &turn.responses {
        println!("{} {}", response.persona.icon(), response.persona.name());
        println!("   {}", response.text);
        if matches!(response.source, ResponseSource::Template) {
            println!("   (scripted response)");
        }
        println!();
    }

    let winner = pick_winner(query);
    println!("🏆 Winning strategy: {} {}", winner.icon(), winner.name());
    println!();
    Ok(())
}

pub async fn cmd_predict(source: &str) -> Result<()> {
    let dataset = load_dataset(source).await?;
    let agg = aggregate(&dataset);
    let responder = PersonaResponder::from_env();

    println!();
    println!("🔮 Predictions ({} trips analyzed)", agg.total_trips);
    println!();
    for prediction in responder.predictions(&agg) {
        println!("{} {}", prediction.persona.icon(), prediction.persona.name());
        println!("   {}", prediction.text);
        println!();
    }
    Ok(())
}
