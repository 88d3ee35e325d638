use medqa::domain::RetrievedPassage;
use medqa::{LiveMedQa, Result};

use super::print_json;

pub async fn run(
    app: &LiveMedQa,
    question: &str,
    limit: usize,
    threshold: Option<f32>,
    json: bool,
) -> Result<()> {
    let passages = app.find_similar(question, limit, threshold).await?;

    if json {
        print_json(&passages)?;
    } else {
        print_passages(&passages);
    }

    if passages.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_passages(passages: &[RetrievedPassage]) {
    if passages.is_empty() {
        println!("No matching passages.");
        return;
    }
    for (i, passage) in passages.iter().enumerate() {
        match passage.relevance_score {
            Some(score) => println!("{}. [{score:.3}]", i + 1),
            None => println!("{}.", i + 1),
        }
        println!("   {}", passage.content.replace('\n', " "));
    }
}
