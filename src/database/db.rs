//! Database operations for the mnemonic review application
//!
//! Handles SQLite initialization, CRUD for stories and their associations,
//! cached quiz questions, and spaced repetition schedules keyed by item id.

use crate::error::{AppError, Result};
use crate::models::{
    ItemId, MnemonicAssociation, Quality, QuizQuestion, SavedStory, ScheduleState, Shape,
    StoryLibrary, srs,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Opens (or creates) the database file and makes sure all tables exist
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Creates tables for stories, associations, schedules and quiz questions
///
/// Schedules and quiz questions cascade away with their story.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS stories (
            id TEXT PRIMARY KEY,
            topic TEXT NOT NULL,
            facts TEXT NOT NULL DEFAULT '[]',
            story TEXT NOT NULL,
            visual_prompt TEXT NOT NULL DEFAULT '',
            image_data TEXT,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS associations (
            story_id TEXT NOT NULL,
            idx INTEGER NOT NULL,
            medical_term TEXT NOT NULL,
            character TEXT NOT NULL,
            explanation TEXT NOT NULL,
            bounding_box TEXT,
            shape TEXT,
            PRIMARY KEY (story_id, idx),
            FOREIGN KEY (story_id) REFERENCES stories(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS schedules (
            story_id TEXT NOT NULL,
            association_index INTEGER NOT NULL,
            repetition_count INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 0,
            last_reviewed_at INTEGER NOT NULL,
            next_due_at INTEGER NOT NULL,
            PRIMARY KEY (story_id, association_index),
            FOREIGN KEY (story_id, association_index)
                REFERENCES associations(story_id, idx) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS quiz_questions (
            story_id TEXT NOT NULL,
            association_index INTEGER NOT NULL,
            question TEXT NOT NULL,
            options TEXT NOT NULL,
            correct_option_index INTEGER NOT NULL,
            explanation TEXT NOT NULL,
            PRIMARY KEY (story_id, association_index),
            FOREIGN KEY (story_id) REFERENCES stories(id) ON DELETE CASCADE
        );",
    )?;
    Ok(())
}

/// Inserts a story or replaces an existing one with the same id
///
/// Associations are rewritten from the story, including their `srs` state.
pub fn save_story(story: &SavedStory, conn: &Connection) -> Result<()> {
    let facts = serde_json::to_string(&story.facts)?;
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO stories (id, topic, facts, story, visual_prompt, image_data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            topic = excluded.topic,
            facts = excluded.facts,
            story = excluded.story,
            visual_prompt = excluded.visual_prompt,
            image_data = excluded.image_data,
            created_at = excluded.created_at",
        params![
            story.id,
            story.topic,
            facts,
            story.story,
            story.visual_prompt,
            story.image_data,
            story.created_at
        ],
    )?;

    // Removing associations also drops their schedules
    tx.execute("DELETE FROM associations WHERE story_id = ?1", params![story.id])?;

    for (idx, association) in story.associations.iter().enumerate() {
        let bounding_box = association
            .bounding_box
            .map(|bbox| serde_json::to_string(&bbox))
            .transpose()?;

        tx.execute(
            "INSERT INTO associations (story_id, idx, medical_term, character, explanation, bounding_box, shape)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                story.id,
                idx as i64,
                association.medical_term,
                association.character,
                association.explanation,
                bounding_box,
                association.shape.map(Shape::as_str)
            ],
        )?;

        if let Some(schedule) = &association.srs {
            upsert_schedule(&ItemId::new(&story.id, idx), schedule, &tx)?;
        }
    }

    tx.commit()?;
    debug!(story_id = %story.id, associations = story.associations.len(), "story saved");
    Ok(())
}

/// Retrieves a single story with its associations and schedules
pub fn get_story(story_id: &str, conn: &Connection) -> Result<Option<SavedStory>> {
    let row = conn
        .query_row(
            "SELECT id, topic, facts, story, visual_prompt, image_data, created_at
             FROM stories WHERE id = ?1",
            params![story_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((id, topic, facts, story, visual_prompt, image_data, created_at)) = row else {
        return Ok(None);
    };

    Ok(Some(SavedStory {
        associations: get_associations(&id, conn)?,
        id,
        topic,
        facts: serde_json::from_str(&facts)?,
        story,
        visual_prompt,
        created_at,
        image_data,
    }))
}

/// Raw association row; schedule columns are NULL when never reviewed
type AssociationRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<u32>,
    Option<f64>,
    Option<u32>,
    Option<i64>,
    Option<i64>,
);

fn get_associations(story_id: &str, conn: &Connection) -> Result<Vec<MnemonicAssociation>> {
    let mut stmt = conn.prepare(
        "SELECT a.medical_term, a.character, a.explanation, a.bounding_box, a.shape,
                s.repetition_count, s.ease_factor, s.interval_days, s.last_reviewed_at, s.next_due_at
         FROM associations a
         LEFT JOIN schedules s ON s.story_id = a.story_id AND s.association_index = a.idx
         WHERE a.story_id = ?1
         ORDER BY a.idx ASC",
    )?;

    let rows = stmt
        .query_map(params![story_id], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<AssociationRow>>>()?;

    rows.into_iter().map(association_from_row).collect()
}

fn association_from_row(row: AssociationRow) -> Result<MnemonicAssociation> {
    let (medical_term, character, explanation, bounding_box, shape, n, ef, i, last, next) = row;

    let bounding_box = bounding_box
        .map(|raw| serde_json::from_str::<[f64; 4]>(&raw))
        .transpose()?;

    let shape = match shape {
        Some(raw) => Some(
            Shape::parse(&raw).ok_or_else(|| AppError::InvalidData(format!("shape '{}'", raw)))?,
        ),
        None => None,
    };

    let srs = match (n, ef, i, last, next) {
        (Some(n), Some(ef), Some(i), Some(last), Some(next)) => Some(ScheduleState {
            repetition_count: n,
            ease_factor: ef,
            interval_days: i,
            last_reviewed_at: millis_to_datetime(last)?,
            next_due_at: millis_to_datetime(next)?,
        }),
        _ => None,
    };

    Ok(MnemonicAssociation {
        medical_term,
        character,
        explanation,
        bounding_box,
        shape,
        srs,
    })
}

/// Loads every story, oldest first
pub fn load_library(conn: &Connection) -> Result<StoryLibrary> {
    let mut stmt = conn.prepare("SELECT id FROM stories ORDER BY created_at ASC, id ASC")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    let mut stories = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(story) = get_story(&id, conn)? {
            stories.push(story);
        }
    }

    Ok(StoryLibrary::new(stories))
}

/// Deletes a story together with its schedules and quiz. Returns false if it did not exist.
pub fn delete_story(story_id: &str, conn: &Connection) -> Result<bool> {
    let removed = conn.execute("DELETE FROM stories WHERE id = ?1", params![story_id])?;
    if removed > 0 {
        info!(story_id, "story deleted");
    }
    Ok(removed > 0)
}

/// Schedule of one association, `None` if it was never reviewed
pub fn get_schedule(item_id: &ItemId, conn: &Connection) -> Result<Option<ScheduleState>> {
    let row = conn
        .query_row(
            "SELECT repetition_count, ease_factor, interval_days, last_reviewed_at, next_due_at
             FROM schedules WHERE story_id = ?1 AND association_index = ?2",
            params![item_id.story_id, item_id.association_index as i64],
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    row.map(|(n, ef, i, last, next)| -> Result<ScheduleState> {
        Ok(ScheduleState {
            repetition_count: n,
            ease_factor: ef,
            interval_days: i,
            last_reviewed_at: millis_to_datetime(last)?,
            next_due_at: millis_to_datetime(next)?,
        })
    })
    .transpose()
}

/// Records a rating for an association and stores the next schedule
pub fn update_schedule(
    item_id: &ItemId,
    quality: Quality,
    conn: &Connection,
) -> Result<ScheduleState> {
    update_schedule_at(item_id, quality, Utc::now(), conn)
}

pub fn update_schedule_at(
    item_id: &ItemId,
    quality: Quality,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<ScheduleState> {
    let story_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM stories WHERE id = ?1)",
        params![item_id.story_id],
        |row| row.get(0),
    )?;
    if !story_exists {
        return Err(AppError::StoryNotFound(item_id.story_id.clone()));
    }

    let association_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM associations WHERE story_id = ?1 AND idx = ?2)",
        params![item_id.story_id, item_id.association_index as i64],
        |row| row.get(0),
    )?;
    if !association_exists {
        return Err(AppError::AssociationOutOfRange {
            story_id: item_id.story_id.clone(),
            index: item_id.association_index,
        });
    }

    let prior = get_schedule(item_id, conn)?;
    let next = srs::compute_next_schedule_at(quality, prior.as_ref(), now);
    upsert_schedule(item_id, &next, conn)?;

    debug!(
        item = %item_id,
        quality = quality.value(),
        interval_days = next.interval_days,
        ease_factor = next.ease_factor,
        "schedule updated"
    );
    Ok(next)
}

fn upsert_schedule(item_id: &ItemId, schedule: &ScheduleState, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO schedules (story_id, association_index, repetition_count, ease_factor, interval_days, last_reviewed_at, next_due_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(story_id, association_index) DO UPDATE SET
            repetition_count = excluded.repetition_count,
            ease_factor = excluded.ease_factor,
            interval_days = excluded.interval_days,
            last_reviewed_at = excluded.last_reviewed_at,
            next_due_at = excluded.next_due_at",
        params![
            item_id.story_id,
            item_id.association_index as i64,
            schedule.repetition_count,
            schedule.ease_factor,
            schedule.interval_days,
            schedule.last_reviewed_at.timestamp_millis(),
            schedule.next_due_at.timestamp_millis()
        ],
    )?;
    Ok(())
}

/// Replaces the cached quiz of a story
pub fn save_quiz(story_id: &str, questions: &[QuizQuestion], conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM quiz_questions WHERE story_id = ?1", params![story_id])?;

    for question in questions {
        tx.execute(
            "INSERT OR REPLACE INTO quiz_questions (story_id, association_index, question, options, correct_option_index, explanation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                story_id,
                question.association_index as i64,
                question.question,
                serde_json::to_string(&question.options)?,
                question.correct_option_index as i64,
                question.explanation
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Quiz questions of a story, ordered by association
pub fn load_quiz(story_id: &str, conn: &Connection) -> Result<Vec<QuizQuestion>> {
    let mut stmt = conn.prepare(
        "SELECT association_index, question, options, correct_option_index, explanation
         FROM quiz_questions WHERE story_id = ?1
         ORDER BY association_index ASC",
    )?;

    let rows = stmt
        .query_map(params![story_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(
            |(association_index, question, options, correct, explanation)| -> Result<QuizQuestion> {
                Ok(QuizQuestion {
                    association_index: to_index(association_index)?,
                    question,
                    options: serde_json::from_str(&options)?,
                    correct_option_index: to_index(correct)?,
                    explanation,
                })
            },
        )
        .collect()
}

/// All cached quizzes keyed by story id
pub fn load_all_quizzes(conn: &Connection) -> Result<HashMap<String, Vec<QuizQuestion>>> {
    let mut stmt = conn.prepare("SELECT DISTINCT story_id FROM quiz_questions")?;
    let story_ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    let mut quizzes = HashMap::new();
    for story_id in story_ids {
        let questions = load_quiz(&story_id, conn)?;
        quizzes.insert(story_id, questions);
    }
    Ok(quizzes)
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| AppError::InvalidData(format!("timestamp {}", ms)))
}

fn to_index(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| AppError::InvalidData(format!("index {}", value)))
}
