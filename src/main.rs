mod app;

use app::MyApp;
use chrono::Utc;
use mnemonic_review_app::config::AppConfig;
use mnemonic_review_app::database::db;
use mnemonic_review_app::models::{MnemonicAssociation, QuizQuestion, SavedStory};
use rusqlite::Connection;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let conn = db::init_database(&config.database_path)?;

    if config.seed_sample_data && db::load_library(&conn)?.stories.is_empty() {
        seed_sample_data(&conn)?;
        info!("sample story created");
    }

    let library = db::load_library(&conn)?;
    let quizzes = db::load_all_quizzes(&conn)?;

    info!(
        stories = library.stories.len(),
        due = library.due_count(Utc::now()),
        "library loaded"
    );
    for story in &library.stories {
        debug!(id = %story.id, topic = %story.topic, terms = story.associations.len(), "story");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([520.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Mnemonic Review",
        options,
        Box::new(move |_cc| Ok(Box::new(MyApp::new(library, quizzes, conn)))),
    )?;
    Ok(())
}

/// Stores one ready-made story with its quiz so a fresh install has something to review
fn seed_sample_data(conn: &Connection) -> mnemonic_review_app::Result<()> {
    let story = SavedStory {
        id: "sample-cardiology".to_string(),
        topic: "Heart Rhythms".to_string(),
        facts: vec![
            "Bradycardia is a resting heart rate below 60 bpm".to_string(),
            "Tachycardia is a resting heart rate above 100 bpm".to_string(),
            "Atrial fibrillation is an irregularly irregular rhythm".to_string(),
        ],
        story: "A snail crawls into a concert hall where a frantic drummer plays, \
                while a juggler keeps dropping pins at random."
            .to_string(),
        associations: vec![
            MnemonicAssociation::new("Bradycardia", "The snail", "Slow like a snail: under 60 bpm"),
            MnemonicAssociation::new("Tachycardia", "The drummer", "Frantic beat: over 100 bpm"),
            MnemonicAssociation::new(
                "Atrial fibrillation",
                "The juggler",
                "Pins fall with no pattern: irregularly irregular",
            ),
        ],
        visual_prompt: "storybook concert hall with a snail, a drummer and a juggler".to_string(),
        created_at: Utc::now().timestamp_millis(),
        image_data: None,
    };

    let terms = ["Bradycardia", "Tachycardia", "Atrial fibrillation"];
    let quiz: Vec<QuizQuestion> = story
        .associations
        .iter()
        .enumerate()
        .map(|(i, assoc)| QuizQuestion {
            association_index: i,
            question: format!("What does {} stand for?", assoc.character.to_lowercase()),
            options: terms.iter().map(|t| t.to_string()).collect(),
            correct_option_index: i,
            explanation: assoc.explanation.clone(),
        })
        .collect();

    db::save_story(&story, conn)?;
    db::save_quiz(&story.id, &quiz, conn)?;
    Ok(())
}
