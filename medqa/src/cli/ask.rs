use medqa::domain::Answer;
use medqa::{LiveMedQa, Result};

use super::print_json;

pub async fn run(
    app: &LiveMedQa,
    question: &str,
    include_sources: bool,
    max_sources: usize,
    json: bool,
) -> Result<()> {
    let answer = app
        .answer_query(question, include_sources, max_sources)
        .await?;

    if json {
        print_json(&answer)
    } else {
        print_answer(&answer);
        Ok(())
    }
}

fn print_answer(answer: &Answer) {
    println!("{}\n", answer.text);
    if let Some(sources) = &answer.sources {
        println!("Sources:");
        for (i, source) in sources.iter().enumerate() {
            let origin = source
                .metadata
                .get("source")
                .or_else(|| source.metadata.get("filename"))
                .map_or_else(|| "(unknown)".to_string(), ToString::to_string);
            println!("  {}. {origin}", i + 1);
            println!("     {}", source.content.replace('\n', " "));
        }
        println!();
    }
    println!(
        "[{} in {:.2}s]",
        answer.model_identifier, answer.latency_seconds
    );
}
