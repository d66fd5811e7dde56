//! Action gate - confirmation in front of destructive actions.

/// Blocking yes/no prompt shown before a delete is sent.
///
/// The prompt is modal: the calling flow waits on the answer.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Answers yes without asking (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, "Confirmation assumed");
        true
    }
}

pub fn delete_prompt(store_id: &str) -> String {
    format!("Delete store {} permanently?", store_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_act_as_prompts() {
        let decline = |_: &str| false;
        assert!(!decline.confirm("x"));
        assert!(AssumeYes.confirm("x"));
    }

    #[test]
    fn prompt_names_the_store() {
        assert_eq!(delete_prompt("store-42"), "Delete store store-42 permanently?");
    }
}
