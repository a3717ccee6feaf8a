//! Tests for the terminal front end driving a controller

mod test_utils;

#[cfg(test)]
mod tests {
    use rootgpt::cli::chat::{Flow, dispatch, parse_line};

    use crate::test_utils::{make_unwritable, test_controller};

    fn run_lines(
        controller: &mut rootgpt::chat::ConversationController<crate::test_utils::ScriptedClient>,
        lines: &[&str],
    ) -> (String, Flow) {
        colored::control::set_override(false);
        let mut out = Vec::new();
        let mut flow = Flow::Continue;
        for line in lines {
            flow = dispatch(controller, parse_line(line), &mut out).unwrap();
            if flow == Flow::Quit {
                break;
            }
        }
        (String::from_utf8(out).unwrap(), flow)
    }

    /// Tests that a message prints the reply
    #[test]
    fn it_prints_replies() {
        let (_dir, mut controller, client) = test_controller();
        client.reply("hi there");

        let (out, flow) = run_lines(&mut controller, &["hello"]);

        assert_eq!(flow, Flow::Continue);
        assert_eq!(out, "RootGPT: hi there\n");
    }

    /// Tests that a failed send prints an inline error
    #[test]
    fn it_prints_remote_errors() {
        let (_dir, mut controller, client) = test_controller();
        client.fail("no candidates");

        let (out, _) = run_lines(&mut controller, &["hello"]);

        assert_eq!(
            out,
            "An error occurred: Response contained no text (no candidates)\n"
        );
    }

    /// Tests that a failed save is reported and the prompt carries on
    #[test]
    fn it_reports_failed_saves() {
        let (_dir, mut controller, client) = test_controller();
        make_unwritable(controller.history_path());

        let (out, flow) = run_lines(&mut controller, &["hello"]);

        assert_eq!(flow, Flow::Continue);
        assert!(out.starts_with("An error occurred: Failed to write chat history"));
        assert!(client.sent.borrow().is_empty());
    }

    /// Tests that a reply is still shown when only saving it failed
    #[test]
    fn it_shows_replies_that_were_not_saved() {
        let (_dir, mut controller, client) = test_controller();
        run_lines(&mut controller, &["hello"]);
        client
            .reply("hi there")
            .make_unwritable_on_send(controller.history_path());

        let (out, flow) = run_lines(&mut controller, &["again", "/list"]);

        assert_eq!(flow, Flow::Continue);
        assert!(out.starts_with(
            "RootGPT: hi there\nAn error occurred: Failed to write chat history"
        ));
        assert!(out.ends_with("* Chat 1\n"));
    }

    /// Tests new, list and switching by number
    #[test]
    fn it_manages_conversations() {
        let (_dir, mut controller, _) = test_controller();

        let (out, _) = run_lines(
            &mut controller,
            &["first", "/new", "second", "/switch 1", "/list"],
        );

        assert_eq!(controller.active(), Some("Chat 1"));
        assert!(out.contains("── Chat 2 ──\n"));
        assert!(out.contains("── Chat 1 ──\nYou: first\nRootGPT: echo: first\n"));
        assert!(out.ends_with("* Chat 1\n  Chat 2\n"));
    }

    /// Tests switching to a conversation that doesn't exist
    #[test]
    fn it_reports_unknown_conversations() {
        let (_dir, mut controller, _) = test_controller();

        let (out, flow) = run_lines(&mut controller, &["/switch Chat 9"]);

        assert_eq!(flow, Flow::Continue);
        assert_eq!(out, "An error occurred: No conversation named 'Chat 9'\n");
        assert_eq!(controller.active(), Some("Chat 1"));
    }

    /// Tests deleting history from the prompt
    #[test]
    fn it_deletes_history() {
        let (_dir, mut controller, _) = test_controller();

        let (out, flow) = run_lines(&mut controller, &["hello", "/new", "/delete"]);

        assert_eq!(flow, Flow::Continue);
        assert!(out.ends_with("Chat history deleted.\n── Chat 1 ──\n"));
        assert!(!controller.history_path().exists());
        assert_eq!(controller.store().len(), 1);
    }

    /// Tests that quitting stops processing further lines
    #[test]
    fn it_quits() {
        let (_dir, mut controller, client) = test_controller();

        let (out, flow) = run_lines(&mut controller, &["/quit", "never sent"]);

        assert_eq!(flow, Flow::Quit);
        assert!(out.is_empty());
        assert!(client.sent.borrow().is_empty());
    }

    /// Tests that blank lines and unknown commands don't reach the model
    #[test]
    fn it_ignores_blank_lines_and_unknown_commands() {
        let (_dir, mut controller, client) = test_controller();

        let (out, _) = run_lines(&mut controller, &["   ", "/frobnicate"]);

        assert_eq!(out, "Unknown command /frobnicate. Type /help for commands.\n");
        assert!(client.sent.borrow().is_empty());
        assert!(!controller.history_path().exists());
    }
}
