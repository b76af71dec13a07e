use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use lectura::app::{App, Flow};
use lectura::audio::{AudioCueController, MemoryBackend};
use lectura::engine::letter_pool::LetterPool;
use lectura::error::{ContentIntegrityError, LoadError};
use lectura::lesson::source::{self, FileLessonSource};
use lectura::lesson::{FillBlankLesson, LessonKind, LessonSet};
use lectura::report::{CompletionReport, RecordingReporter};
use lectura::session::{
    AdvanceOutcome, ExerciseSession, NarratedGate, ReadingStep, Rejection, SelectOutcome,
    SessionOptions,
};
use tempfile::TempDir;

const EXERCISES: &str = r#"[
  {
    "id": 3,
    "tipoEjercicio": "CP",
    "titulo": "Vocales",
    "contenido": {
      "Ejercicios": [
        { "id": 1, "oracion": "C_S_", "respuesta": "CASA", "letrasDisponibles": ["A", "S", "X"], "letrasCorrectas": ["A", "A"] },
        { "id": 2, "oracion": "p_t_", "audio": "pato", "letrasDisponibles": ["a", "o", "e"], "letrasCorrectas": ["a", "o"] },
        { "id": 3, "oracion": "sol_", "respuesta": "sol", "letrasDisponibles": [] }
      ],
      "audios": [{ "url": "a1.mp3" }, { "url": "a2.mp3" }, { "url": "a3.mp3" }]
    }
  },
  {
    "id": 4,
    "tipoEjercicio": "LT",
    "titulo": "Otra cosa",
    "contenido": { "Ejercicios": [], "audios": [] }
  },
  {
    "id": 9,
    "tipoEjercicio": "CP",
    "titulo": "Más vocales",
    "contenido": {
      "Ejercicios": [
        { "id": 4, "oracion": "m_s_", "respuesta": "mesa", "letrasDisponibles": ["e", "a"] }
      ],
      "audios": ["b1.mp3"]
    }
  }
]"#;

const READING: &str = r#"{
  "id": 7,
  "titulo": "La S",
  "contenido": {
    "lecciones": [
      { "id": 1, "titulo": "Sonido", "texto": "Sasha sale", "highlights": ["sa"], "sounds": [] },
      { "id": 2, "titulo": "Palabras", "texto": "sol, sapo", "highlights": [], "sounds": ["s"] }
    ],
    "audios": ["s1.mp3"]
  },
  "quiz": 42
}"#;

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn exercise_set() -> LessonSet {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "ejercicios.json", EXERCISES);
    let (set, report) = source::load_fill_blank(&FileLessonSource::new(&path), "CP", '_').unwrap();
    assert_eq!(report.accepted, 3);
    set
}

fn options() -> SessionOptions {
    SessionOptions {
        username: "ana".to_string(),
        score: 10,
    }
}

fn app_with(reporter: &RecordingReporter, gate: NarratedGate) -> App<MemoryBackend> {
    App::new(MemoryBackend::new(), Arc::new(reporter.clone()), options(), gate)
}

#[test]
fn test_file_load_skips_broken_lessons_and_keeps_order() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "ejercicios.json", EXERCISES);
    let (set, report) = source::load_fill_blank(&FileLessonSource::new(&path), "CP", '_').unwrap();

    assert_eq!(set.id, 9);
    assert_eq!(set.len(), 3);
    assert_eq!(
        report.rejected,
        vec![ContentIntegrityError::LengthMismatch {
            lesson_id: 3,
            sentence_len: 4,
            key_len: 3
        }]
    );
    let ids: Vec<u64> = set.lessons().iter().map(|l| l.id()).collect();
    assert_eq!(ids, vec![1, 2, 4]);
    assert_eq!(
        set.audio_urls(),
        vec![
            Some("a1.mp3".to_string()),
            Some("a2.mp3".to_string()),
            Some("b1.mp3".to_string())
        ]
    );
    assert_eq!(set.fill_blank_at(1).unwrap().sentence_text(), "p_t_");
}

#[test]
fn test_unknown_exercise_type_blocks_entry() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "ejercicios.json", EXERCISES);
    let result = source::load_fill_blank(&FileLessonSource::new(&path), "ZZ", '_');
    assert!(matches!(result, Err(LoadError::Empty { .. })));
}

#[test]
fn test_full_fill_blank_flow_reports_once() {
    let reporter = RecordingReporter::new();
    let mut app = app_with(&reporter, NarratedGate::AfterPlayback);

    let ticket = app.begin_load(LessonKind::FillBlank);
    assert!(app.finish_load(ticket, Ok(exercise_set())).unwrap());

    assert_eq!(app.select('X'), Some(SelectOutcome::Rejected(Rejection::NotRequired)));
    assert!(matches!(app.select('A'), Some(SelectOutcome::Placed { completed: true, .. })));
    assert_eq!(app.advance(), Some(AdvanceOutcome::Next(1)));

    app.select('a');
    assert_eq!(app.advance(), Some(AdvanceOutcome::Blocked));
    app.select('o');
    assert_eq!(app.advance(), Some(AdvanceOutcome::Next(2)));

    app.select('e');
    app.select('a');
    assert_eq!(app.advance(), Some(AdvanceOutcome::Finished { reported: true }));
    assert_eq!(app.advance(), Some(AdvanceOutcome::Blocked));

    assert_eq!(reporter.reports(), vec![CompletionReport::new("ana", 9, 10)]);

    let backend = app.audio().backend();
    let urls: Vec<&str> = backend.started().iter().map(|(_, u)| u.as_str()).collect();
    assert_eq!(urls, vec!["a1.mp3", "a2.mp3", "b1.mp3"]);
    assert!(backend.live().is_empty());
    assert_eq!(backend.released().len(), 3);
}

#[test]
fn test_failed_report_still_finishes() {
    let reporter = RecordingReporter::failing();
    let mut app = app_with(&reporter, NarratedGate::AfterPlayback);
    let ticket = app.begin_load(LessonKind::FillBlank);
    let set = LessonSet::fill_blank(
        5,
        vec![FillBlankLesson::new(1, "C_S_", "CASA", &['A', 'S', 'X'])],
    );
    app.finish_load(ticket, Ok(set)).unwrap();

    app.select('A');
    assert_eq!(app.advance(), Some(AdvanceOutcome::Finished { reported: false }));
    assert!(app.exercise().unwrap().is_finished());
    assert_eq!(reporter.reports().len(), 1);
}

#[test]
fn test_pool_always_covers_requirement() {
    let set = exercise_set();
    for i in 0..set.len() {
        let lesson = set.fill_blank_at(i).unwrap();
        let required = lesson.requirement();
        let pool = LetterPool::build(&lesson.designer_letters, &required);
        for (&letter, &count) in &required {
            assert!(pool.count(letter) >= count, "lesson {} short of {letter:?}", lesson.id);
        }
    }

    let sparse = FillBlankLesson::new(1, "_a_a_a", "papaya", &[]);
    let pool = sparse.build_pool();
    assert!(pool.satisfies(&sparse.requirement()));
    assert_eq!(pool.len(), 3);
}

#[test]
fn test_selection_conserves_letters() {
    let set = LessonSet::fill_blank(
        1,
        vec![FillBlankLesson::new(1, "_r_s _e_", "tres mes", &['t', 'e', 'q', 'm'])],
    );
    let mut session =
        ExerciseSession::new(&set, options(), Box::new(RecordingReporter::new())).unwrap();
    let total = session.pool().len();

    for letter in ['q', 'e', 'e', 't', 'z', 's', 'm', 'm', 'e'] {
        let was_complete = session.is_complete();
        session.select(letter);
        let placed = session.slots().iter().filter(|s| s.placed.is_some()).count();
        assert_eq!(placed + session.pool().len(), total);
        if was_complete {
            assert!(session.is_complete());
        }
    }
    assert!(session.is_complete());
    assert_eq!(session.rendered_sentence(), "tres mes");
}

#[test]
fn test_advance_without_completion_changes_nothing() {
    let mut session =
        ExerciseSession::new(&exercise_set(), options(), Box::new(RecordingReporter::new()))
            .unwrap();
    session.select('X');
    let phase = session.phase();
    let pool = session.pool().letters().to_vec();
    let slots = session.slots().to_vec();

    for _ in 0..3 {
        assert_eq!(session.advance(), AdvanceOutcome::Blocked);
        assert_eq!(session.phase(), phase);
        assert_eq!(session.pool().letters(), pool.as_slice());
        assert_eq!(session.slots(), slots.as_slice());
    }
}

#[test]
fn test_one_live_handle_after_any_sequence() {
    let urls = ["a.mp3", "b.mp3", "c.mp3", "d.mp3"];
    let mut controller = AudioCueController::new(MemoryBackend::new());
    controller.set_lessons(urls.iter().map(|u| Some(u.to_string())).collect());

    let mut tokens = Vec::new();
    for lesson in [0, 2, 1, 1, 3, 0] {
        tokens.push(controller.play_for_lesson(lesson).unwrap());
        assert_eq!(controller.backend().live().len(), 1);
    }
    let last = tokens.pop().unwrap();
    assert_eq!(controller.backend().live(), vec![last]);
    assert_eq!(controller.backend().released(), tokens);

    controller.stop();
    controller.stop();
    assert!(controller.backend().live().is_empty());
    let mut released = controller.backend().released();
    assert_eq!(released.len(), 6);
    released.sort();
    released.dedup();
    assert_eq!(released.len(), 6);
}

#[test]
fn test_exit_during_load_discards_result() {
    let reporter = RecordingReporter::new();
    let mut app = app_with(&reporter, NarratedGate::AfterPlayback);
    let ticket = app.begin_load(LessonKind::FillBlank);
    app.exit();

    assert!(!app.finish_load(ticket, Ok(exercise_set())).unwrap());
    assert!(matches!(app.flow, Flow::Exited));
    assert!(app.audio().backend().started().is_empty());
    assert!(app.select('A').is_none());
}

#[test]
fn test_narrated_flow_to_quiz() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "leccion.json", READING);
    let (set, report) = source::load_narrated(&FileLessonSource::new(&path), 7).unwrap();
    assert_eq!(set.quiz_id, Some(42));
    assert_eq!(report.warnings.len(), 1);

    let reporter = RecordingReporter::new();
    let mut app = app_with(&reporter, NarratedGate::AfterPlayback);
    let ticket = app.begin_load(LessonKind::Narrated);
    app.finish_load(ticket, Ok(set)).unwrap();

    assert_eq!(app.next(), Some(ReadingStep::Blocked));
    let token = app.audio().active_token().unwrap();
    app.audio().backend().break_off(token);
    app.pump_audio();
    assert!(app.can_advance());

    // the second lesson has no narration, so it never gates
    assert_eq!(app.next(), Some(ReadingStep::Moved(1)));
    assert!(app.can_advance());
    assert_eq!(app.next(), Some(ReadingStep::Quiz(42)));

    assert!(app.audio().backend().live().is_empty());
    assert!(reporter.reports().is_empty());
}

#[test]
fn test_narrated_back_from_first_lesson_leaves() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "leccion.json", READING);
    let (set, _) = source::load_narrated(&FileLessonSource::new(&path), 7).unwrap();

    let mut app = app_with(&RecordingReporter::new(), NarratedGate::Always);
    let ticket = app.begin_load(LessonKind::Narrated);
    app.finish_load(ticket, Ok(set)).unwrap();

    assert_eq!(app.next(), Some(ReadingStep::Moved(1)));
    assert_eq!(app.previous(), Some(ReadingStep::Moved(0)));
    assert_eq!(app.previous(), Some(ReadingStep::ExitFlow));
    assert!(app.is_exited());
    assert!(app.audio().backend().live().is_empty());
}
