use quizlens_types::{ImageAttachment, Role, Turn};
use uuid::Uuid;

/// Client-held chat history for one captured image
///
/// Always opens with the system instruction followed by the user turn that
/// carries the image. The whole sequence is resent on every request.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: Uuid,
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub fn start(system_prompt: &str, analyze_prompt: &str, image: ImageAttachment) -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: vec![
                Turn::system(system_prompt),
                Turn::user_with_image(analyze_prompt, image),
            ],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::assistant(text));
    }

    /// Drop a trailing user turn whose request failed
    pub fn rollback_user(&mut self) -> Option<Turn> {
        // the opening image turn is never rolled back
        if self.turns.len() > 2 && self.turns.last().is_some_and(|t| t.role == Role::User) {
            self.turns.pop()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ConversationSession {
        ConversationSession::start(
            "system",
            "analyze",
            ImageAttachment::png("QUJD".into(), "high"),
        )
    }

    #[test]
    fn opens_with_system_then_image_turn() {
        let session = session();
        let turns = session.turns();

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], Turn::system("system"));
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[1].text(), "analyze");
        assert!(turns[1].image().is_some());
    }

    #[test]
    fn appends_in_order() {
        let mut session = session();
        session.push_assistant("first answer");
        session.push_user("why?");
        session.push_assistant("because");

        let roles: Vec<Role> = session.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(session.turns()[4], Turn::assistant("because"));
    }

    #[test]
    fn rollback_only_removes_trailing_follow_up() {
        let mut session = session();
        assert!(session.rollback_user().is_none());
        assert_eq!(session.len(), 2);

        session.push_assistant("answer");
        assert!(session.rollback_user().is_none());

        session.push_user("follow up");
        assert_eq!(session.rollback_user(), Some(Turn::user("follow up")));
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn sessions_get_distinct_ids() {
        assert_ne!(session().id(), session().id());
    }
}
