//! Main application UI and state management.
//! Shows the story library with due counts and runs Daily Review and quiz sessions.

use chrono::{DateTime, Local, Utc};
use eframe::egui;
use mnemonic_review_app::database::{SqliteReviewStore, db};
use mnemonic_review_app::error::{AppError, Result};
use mnemonic_review_app::export::json::{StoryBundle, export_story_to_path, import_story};
use mnemonic_review_app::models::library::due_count_for_story;
use mnemonic_review_app::models::{
    QuizQuestion, ReviewRating, ReviewSession, SessionMode, SessionState, StoryLibrary,
    build_review_queue, srs,
};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Library,
    Review,
}

/// Main application state
pub struct MyApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    library: StoryLibrary,
    quizzes: HashMap<String, Vec<QuizQuestion>>,
    selected_story_index: Option<usize>,
    conn: Arc<Mutex<Connection>>,

    current_screen: AppScreen,
    session: Option<ReviewSession<SqliteReviewStore>>,
    /// Story a plain quiz was started from: (id, topic)
    quiz_story: Option<(String, String)>,

    show_export_dialog: bool,
    show_message_dialog: bool,
    message: String,
}

/// Formats a timestamp as a local YYYY-MM-DD string
fn format_date(time: DateTime<Utc>) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d").to_string()
}

/// Short label for an interval, e.g. "1d", "2w", "3mo"
fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Library => self.render_library_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        // exporting a story
        if self.show_export_dialog {
            let mut export_story_index: Option<usize> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Story")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a story to export:");
                    ui.separator();

                    for (i, story) in self.library.stories.iter().enumerate() {
                        if ui
                            .button(format!("{} ({} terms)", story.topic, story.associations.len()))
                            .clicked()
                        {
                            export_story_index = Some(i);
                        }
                    }

                    ui.separator();

                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(i) = export_story_index {
                self.handle_export(i);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if self.show_message_dialog {
            egui::Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_message_dialog = false;
                    }
                });
        }
    }
}

impl MyApp {
    /// Creates the application with the library loaded from the database
    pub fn new(
        library: StoryLibrary,
        quizzes: HashMap<String, Vec<QuizQuestion>>,
        conn: Connection,
    ) -> Self {
        let has_stories = !library.stories.is_empty();
        Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            library,
            quizzes,
            selected_story_index: if has_stories { Some(0) } else { None },
            conn: Arc::new(Mutex::new(conn)),
            current_screen: AppScreen::Library,
            session: None,
            quiz_story: None,
            show_export_dialog: false,
            show_message_dialog: false,
            message: String::new(),
        }
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AppError::LockPoisoned)
    }

    fn show_message(&mut self, message: String) {
        self.message = message;
        self.show_message_dialog = true;
    }

    /// Re-reads stories and quizzes so due counts reflect the latest ratings
    fn reload(&mut self) {
        let loaded = self.lock_conn().and_then(|conn| {
            Ok((db::load_library(&conn)?, db::load_all_quizzes(&conn)?))
        });

        match loaded {
            Ok((library, quizzes)) => {
                self.library = library;
                self.quizzes = quizzes;
                if self
                    .selected_story_index
                    .is_some_and(|i| i >= self.library.stories.len())
                {
                    self.selected_story_index = None;
                }
            }
            Err(e) => self.show_message(format!("Failed to load library: {}", e)),
        }
    }

    /// Renders the library screen with the Daily Review card and story list
    fn render_library_screen(&mut self, ctx: &egui::Context) {
        let now = Utc::now();
        let due_total = self.library.due_count(now);

        // We store actions to execute after UI rendering to avoid borrowing conflicts
        let mut action_review = false;
        let mut action_import = false;
        let mut action_select: Option<usize> = None;
        let mut action_quiz: Option<usize> = None;
        let mut action_delete: Option<usize> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format_date(now));
                ui.separator();
                if ui.button("Export Story").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Story").clicked() {
                    action_import = true;
                }
            });

            ui.separator();

            ui.group(|ui| {
                ui.heading("Daily Review");
                if due_total > 0 {
                    ui.label(format!(
                        "You have {} items due for interleaved spaced repetition.",
                        due_total
                    ));
                } else {
                    ui.label("Nothing due. Come back tomorrow!");
                }
                if ui
                    .add_enabled(due_total > 0, egui::Button::new("Start Daily Review"))
                    .clicked()
                {
                    action_review = true;
                }
            });

            ui.separator();

            ui.heading(format!("Stories ({})", self.library.stories.len()));

            egui::ScrollArea::vertical()
                .id_source("stories_list")
                .max_height(220.0)
                .show(ui, |ui| {
                    for (i, story) in self.library.stories.iter().enumerate() {
                        let is_selected = self.selected_story_index == Some(i);
                        let due = due_count_for_story(story, now);
                        let has_quiz = self.quizzes.get(&story.id).is_some_and(|q| !q.is_empty());

                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(
                                    is_selected,
                                    format!(
                                        "{}. {} ({} due / {} terms)",
                                        i + 1,
                                        story.topic,
                                        due,
                                        story.associations.len()
                                    ),
                                )
                                .clicked()
                            {
                                action_select = Some(i);
                            }

                            if ui.add_enabled(has_quiz, egui::Button::new("Quiz")).clicked() {
                                action_quiz = Some(i);
                            }
                            if ui.button("Delete").clicked() {
                                action_delete = Some(i);
                            }
                        });
                    }
                });

            ui.separator();

            // Associations of the selected story with their schedules
            match self.selected_story_index.and_then(|i| self.library.stories.get(i)) {
                Some(story) => {
                    ui.heading(story.topic.as_str());
                    ui.label(&story.story);
                    ui.add_space(8.0);

                    egui::ScrollArea::vertical()
                        .id_source("associations_list")
                        .max_height(240.0)
                        .show(ui, |ui| {
                            for (i, assoc) in story.associations.iter().enumerate() {
                                ui.group(|ui| {
                                    ui.label(format!(
                                        "{}. {} = {}",
                                        i + 1,
                                        assoc.medical_term,
                                        assoc.character
                                    ));
                                    let status = match &assoc.srs {
                                        None => "New".to_string(),
                                        Some(s) if srs::is_due_at(Some(s), now) => {
                                            "Due now".to_string()
                                        }
                                        Some(s) => format!(
                                            "Next review {} (every {})",
                                            format_date(s.next_due_at),
                                            format_interval(s.interval_days)
                                        ),
                                    };
                                    ui.label(format!("   {}", status));
                                });
                            }
                        });
                }
                None => {
                    ui.label("Select a story to see its terms");
                }
            }
        });

        // Execute deferred actions
        if let Some(i) = action_select {
            self.selected_story_index = Some(i);
        }
        if action_review {
            self.start_daily_review();
        }
        if let Some(i) = action_quiz {
            self.start_quiz(i);
        }
        if let Some(i) = action_delete {
            self.handle_delete(i);
        }
        if action_import {
            self.handle_import();
        }
    }

    /// Renders the review screen for the running session
    fn render_review_screen(&mut self, ctx: &egui::Context) {
        // Store actions to execute after UI rendering
        let mut action_select: Option<usize> = None;
        let mut action_rate: Option<ReviewRating> = None;
        let mut action_advance = false;
        let mut action_back = false;
        let mut action_dismiss_sync = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &self.session else {
                action_back = true;
                return;
            };

            match session.mode() {
                SessionMode::Interleaved => {
                    ui.heading(format!("Daily Review ({} due today)", session.remaining()));
                }
                SessionMode::Quiz => {
                    let topic = self.quiz_story.as_ref().map_or("", |(_, topic)| topic.as_str());
                    ui.heading(format!("Quiz: {}", topic));
                }
            }

            if let Some(error) = session.last_sync_error() {
                ui.horizontal(|ui| {
                    ui.colored_label(
                        egui::Color32::from_rgb(200, 60, 60),
                        format!("Could not save your last rating: {}", error),
                    );
                    if ui.small_button("Dismiss").clicked() {
                        action_dismiss_sync = true;
                    }
                });
            }

            ui.add_space(10.0);

            if session.is_complete() {
                ui.heading("Session complete!");
                ui.label(format!("You scored {}", session.score()));
                ui.add_space(20.0);
                if ui.button("Back to Library").clicked() {
                    action_back = true;
                }
                return;
            }

            if let Some(item) = session.current_item() {
                ui.label(&item.context.topic);
                if item.is_relearning() {
                    ui.colored_label(
                        egui::Color32::from_rgb(210, 130, 20),
                        format!("Relearning ({} left)", item.relearn_count),
                    );
                }
            }

            if let Some(character) = self.highlighted_character() {
                ui.label(format!("Look at: {}", character));
            }

            let Some(question) = session.current_question() else {
                return;
            };

            ui.group(|ui| {
                ui.set_min_height(80.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(10.0);
                    ui.heading(question.question.as_str());
                    ui.add_space(10.0);
                });
            });

            ui.add_space(10.0);

            let answered = match session.state() {
                SessionState::Answered { selected, correct } => Some((selected, correct)),
                _ => None,
            };

            for (i, option) in question.options.iter().enumerate() {
                let mut text = egui::RichText::new(option);
                if let Some((selected, _)) = answered {
                    if i == question.correct_option_index {
                        text = text.color(egui::Color32::from_rgb(20, 130, 90)).strong();
                    } else if i == selected {
                        text = text.color(egui::Color32::from_rgb(200, 60, 60));
                    }
                }
                if ui
                    .add_enabled(answered.is_none(), egui::Button::new(text))
                    .clicked()
                {
                    action_select = Some(i);
                }
            }

            if let Some((_, correct)) = answered {
                ui.add_space(10.0);
                ui.label(if correct { "Correct!" } else { "Not quite." });
                ui.label(&question.explanation);
                ui.add_space(10.0);

                match (session.mode(), correct) {
                    (SessionMode::Interleaved, true) => {
                        let prior = session.current_item().and_then(|item| {
                            session
                                .collaborator()
                                .stored_schedule(&item.item_id)
                                .or_else(|| {
                                    let index = item.item_id.association_index;
                                    self.library
                                        .find(&item.item_id.story_id)
                                        .and_then(|s| s.associations.get(index))
                                        .and_then(|a| a.srs.as_ref())
                                })
                        });

                        ui.label("How hard was it to recall?");
                        ui.horizontal(|ui| {
                            for (rating, days) in srs::preview_intervals(prior) {
                                if !ReviewRating::SUCCESS.contains(&rating) {
                                    continue;
                                }
                                let label =
                                    format!("{} ({})", rating.label(), format_interval(days));
                                if ui.button(label).clicked() {
                                    action_rate = Some(rating);
                                }
                            }
                        });
                    }
                    (SessionMode::Interleaved, false) => {
                        if ui.button("Continue").clicked() {
                            action_advance = true;
                        }
                    }
                    (SessionMode::Quiz, _) => {
                        if ui.button("Next").clicked() {
                            action_advance = true;
                        }
                    }
                }
            }

            ui.add_space(20.0);

            if ui.button("Exit Session").clicked() {
                action_back = true;
            }
        });

        // Execute deferred actions
        let mut failure = None;
        if let Some(session) = &mut self.session {
            if action_dismiss_sync {
                session.clear_sync_error();
            }
            if let Some(i) = action_select {
                if let Err(e) = session.select_option(i) {
                    failure = Some(e);
                }
            }
            if let Some(rating) = action_rate {
                if let Err(e) = session.rate(rating) {
                    failure = Some(e);
                }
            }
            if action_advance {
                if let Err(e) = session.advance() {
                    failure = Some(e);
                }
            }
        }
        if let Some(e) = failure {
            warn!(error = %e, "review action rejected");
            self.show_message(e.to_string());
        }
        if action_back {
            self.end_session();
        }
    }

    /// Character of the association currently under review, if any
    fn highlighted_character(&self) -> Option<&str> {
        let session = self.session.as_ref()?;
        let store = session.collaborator();
        let index = store.highlighted()?;
        let story_id = match session.mode() {
            SessionMode::Interleaved => store.current_item()?.story_id.as_str(),
            SessionMode::Quiz => self.quiz_story.as_ref()?.0.as_str(),
        };
        self.library
            .find(story_id)?
            .associations
            .get(index)
            .map(|a| a.character.as_str())
    }

    /// Starts an interleaved review over every due association that has a question
    fn start_daily_review(&mut self) {
        let queue = build_review_queue(&self.library.stories, &self.quizzes, Utc::now());
        if queue.is_empty() {
            self.show_message("The due items have no quiz questions yet.".to_string());
            return;
        }

        self.session = Some(ReviewSession::interleaved(
            queue,
            SqliteReviewStore::new(Arc::clone(&self.conn)),
        ));
        self.quiz_story = None;
        self.current_screen = AppScreen::Review;
    }

    /// Starts a plain quiz over one story's questions
    fn start_quiz(&mut self, story_index: usize) {
        let Some(story) = self.library.stories.get(story_index) else {
            return;
        };
        let questions = self.quizzes.get(&story.id).cloned().unwrap_or_default();
        if questions.is_empty() {
            return;
        }

        self.quiz_story = Some((story.id.clone(), story.topic.clone()));
        self.session = Some(ReviewSession::quiz(
            questions,
            SqliteReviewStore::new(Arc::clone(&self.conn)),
        ));
        self.current_screen = AppScreen::Review;
    }

    fn end_session(&mut self) {
        self.session = None;
        self.quiz_story = None;
        self.current_screen = AppScreen::Library;
        self.reload();
    }

    fn handle_delete(&mut self, story_index: usize) {
        let Some(story_id) = self.library.stories.get(story_index).map(|s| s.id.clone()) else {
            return;
        };

        let deleted = self.lock_conn().and_then(|conn| db::delete_story(&story_id, &conn));
        match deleted {
            Ok(_) => {
                self.library.remove(&story_id);
                self.quizzes.remove(&story_id);
                self.selected_story_index = None;
            }
            Err(e) => self.show_message(format!("Failed to delete story: {}", e)),
        }
    }

    /// Handles story export to JSON file
    fn handle_export(&mut self, story_index: usize) {
        self.show_export_dialog = false;
        let Some(story) = self.library.stories.get(story_index) else {
            return;
        };

        // Open file save dialog
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", story.topic))
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };

        let bundle = StoryBundle {
            story: story.clone(),
            quiz: self.quizzes.get(&story.id).cloned().unwrap_or_default(),
        };
        let message = match export_story_to_path(&bundle, &path) {
            Ok(_) => format!("Story '{}' exported successfully!", bundle.story.topic),
            Err(e) => format!("Export failed: {}", e),
        };
        self.show_message(message);
    }

    /// Handles story import from JSON file
    fn handle_import(&mut self) {
        // Open file selection dialog
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let bundle = match import_story(&path) {
            Ok(bundle) => bundle,
            Err(e) => {
                self.show_message(format!(
                    "Import failed: {}\n\nPlease check if the file has correct structure:\n{{\n  \"story\": {{ ... }},\n  \"quiz\": [...]\n}}",
                    e
                ));
                return;
            }
        };

        // Check if a story with this id already exists
        if self.library.find(&bundle.story.id).is_some() {
            self.show_message(format!(
                "Story '{}' already exists! Delete it first to re-import.",
                bundle.story.topic
            ));
            return;
        }

        let saved = self.lock_conn().and_then(|conn| {
            db::save_story(&bundle.story, &conn)?;
            db::save_quiz(&bundle.story.id, &bundle.quiz, &conn)
        });
        if let Err(e) = saved {
            self.show_message(format!("Failed to import story: {}", e));
            return;
        }

        self.reload();
        self.show_message(format!(
            "Story '{}' imported successfully with {} terms!",
            bundle.story.topic,
            bundle.story.associations.len()
        ));
    }
}
