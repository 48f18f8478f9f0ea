use stepquill::config::Config;
use stepquill::document::tree::Document;
use stepquill::editor::session::EditorSession;
use stepquill::input::{parse_command, CommandHandler, ParseError, Reply, SessionCommand};
use stepquill::view::RecordingView;

fn run_script(script: &str) -> (EditorSession, Vec<Reply>) {
    let mut session =
        EditorSession::new(Document::default(), RecordingView::new(), &Config::default());
    let mut handler = CommandHandler::new();
    let mut replies = Vec::new();
    for line in script.lines() {
        if let Some(command) = parse_command(line).unwrap() {
            replies.push(handler.execute(command, &mut session).unwrap());
        }
    }
    (session, replies)
}

fn names_at(session: &EditorSession, path: &[usize]) -> Vec<String> {
    let doc = session.document();
    let step = doc.find_by_path(path).unwrap();
    doc.children(step)
        .unwrap()
        .iter()
        .map(|&c| doc.step(c).unwrap().name().unwrap_or("").to_string())
        .collect()
}

#[test]
fn test_parse_rejects_bad_arguments() {
    assert_eq!(
        parse_command("unnote 0 x"),
        Err(ParseError::InvalidIndex("x".to_string()))
    );
    assert_eq!(
        parse_command("text 0"),
        Err(ParseError::MissingArgument {
            command: "text".to_string(),
            argument: "some text"
        })
    );
    assert_eq!(parse_command("  undo  ").unwrap(), Some(SessionCommand::Undo));
}

#[test]
fn test_script_builds_and_indents() {
    let (session, _) = run_script(
        "add A
         add B
         add C
         select 1 2
         indent",
    );
    assert_eq!(names_at(&session, &[]), vec!["A"]);
    assert_eq!(names_at(&session, &[0]), vec!["B", "C"]);
}

#[test]
fn test_script_undo_redo_messages() {
    let (session, replies) = run_script(
        "add A
         text 0 mix gently
         undo
         undo
         undo
         redo",
    );
    let messages: Vec<_> = replies
        .into_iter()
        .map(|r| match r {
            Reply::Message(m) => m,
            Reply::Quit => "quit".to_string(),
        })
        .collect();
    assert_eq!(
        messages,
        vec![
            "Add Step",
            "Add Parameter",
            "Undid Add Parameter",
            "Undid Add Step",
            "Nothing to undo",
            "Redid Add Step",
        ]
    );
    assert_eq!(names_at(&session, &[]), vec!["A"]);
    let doc = session.document();
    let a = doc.find_by_path(&[0]).unwrap();
    assert_eq!(doc.step(a).unwrap().content_count(), 0);
}

#[test]
fn test_script_template_strips_notes() {
    let (session, _) = run_script(
        "experiment Ada
         add Fix
         note 0 cells rounded up
         template",
    );
    let doc = session.document();
    assert!(doc.experiment_info().is_none());
    let fix = doc.find_by_path(&[0]).unwrap();
    assert_eq!(doc.step(fix).unwrap().note_count(), 0);
}

#[test]
fn test_show_renders_outline() {
    let (_, replies) = run_script(
        "add Fix
         param 0 Time 15
         show",
    );
    match replies.last() {
        Some(Reply::Message(text)) => assert!(text.contains("Fix: Time=15"), "{}", text),
        other => panic!("unexpected reply {:?}", other),
    }
}

#[test]
fn test_script_nan_word_stays_editable() {
    let (session, replies) = run_script(
        "add Mix
         param 0 Volume NaN
         clear-values
         unparam 0 0
         undo
         undo
         undo",
    );
    assert_eq!(replies.len(), 7);
    let doc = session.document();
    let mix = doc.find_by_path(&[0]).unwrap();
    assert_eq!(doc.step(mix).unwrap().content_count(), 0);
    assert_eq!(session.redo_label(), Some("Add Parameter"));
}

#[test]
fn test_script_link_records_mime_type() {
    let (session, _) = run_script(
        "add Image
         link 0 gel gel.tif image/tiff",
    );
    let doc = session.document();
    let image = doc.find_by_path(&[0]).unwrap();
    let data_ref = doc.step(image).unwrap().data_ref_at(0).unwrap();
    assert_eq!(data_ref.mime_type.as_deref(), Some("image/tiff"));
}
