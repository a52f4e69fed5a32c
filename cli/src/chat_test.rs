use super::*;

#[test]
fn parse_commands() {
    assert_eq!(InputCommand::parse("/quit"), InputCommand::Quit);
    assert_eq!(InputCommand::parse("  /q "), InputCommand::Quit);
    assert_eq!(InputCommand::parse("/up"), InputCommand::ScrollUp);
    assert_eq!(InputCommand::parse("/down"), InputCommand::ScrollDown);
}

#[test]
fn blank_line_retries() {
    assert_eq!(InputCommand::parse(""), InputCommand::Retry);
    assert_eq!(InputCommand::parse("   "), InputCommand::Retry);
}

#[test]
fn other_lines_are_text() {
    assert_eq!(InputCommand::parse("hello there"), InputCommand::Text("hello there".to_owned()));
    assert_eq!(InputCommand::parse("/shrug\r"), InputCommand::Text("/shrug".to_owned()));
}

#[test]
fn lines_during_a_send_get_a_notice() {
    let mut state = ChatState::default();
    assert_eq!(busy_notice(&state), None);

    state.send = SendState::Sending;
    assert_eq!(busy_notice(&state).as_deref(), Some(STILL_SENDING));

    state.send = SendState::Failed;
    assert_eq!(busy_notice(&state), None);
}
