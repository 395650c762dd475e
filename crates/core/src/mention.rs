/// Removes the addressing token from a mention and returns the question.
///
/// A leading `<@ID>` (or `<@ID|name>`) is removed only when it addresses the
/// known bot user; references to other users stay part of the question. A
/// plain `@name` token is always treated as the addressing token. Text that
/// does not start with a mention keeps every word.
pub fn strip_mention(raw_text: &str, mentioned_user_id: Option<&str>) -> String {
    let trimmed = raw_text.trim_start();
    let Some((first, rest)) = split_first_token(trimmed) else {
        return String::new();
    };

    let is_mention = match (mention_user_id(first), mentioned_user_id) {
        (Some(found), Some(bot)) => found == bot,
        (Some(_), None) => true,
        (None, _) => is_plain_mention(first),
    };

    if is_mention {
        rest.trim().to_owned()
    } else {
        trimmed.trim_end().to_owned()
    }
}

fn split_first_token(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    match text.find(char::is_whitespace) {
        Some(index) => Some((&text[..index], &text[index..])),
        None => Some((text, "")),
    }
}

fn mention_user_id(token: &str) -> Option<&str> {
    let inner = token.strip_prefix("<@")?.strip_suffix('>')?;
    let id = inner.split('|').next().unwrap_or(inner);
    (!id.is_empty()).then_some(id)
}

fn is_plain_mention(token: &str) -> bool {
    token.len() > 1 && token.starts_with('@')
}

#[cfg(test)]
mod tests {
    use super::strip_mention;

    #[test]
    fn strips_plain_at_mention() {
        assert_eq!(strip_mention("@bot what is 2+2", None), "what is 2+2");
        assert_eq!(strip_mention("@bot what is 2+2", Some("U0BOT")), "what is 2+2");
    }

    #[test]
    fn strips_slack_user_reference_for_known_bot() {
        assert_eq!(
            strip_mention("<@U0BOT> what restaurants are nearby?", Some("U0BOT")),
            "what restaurants are nearby?"
        );
        assert_eq!(strip_mention("<@U0BOT|askbot>   hello", Some("U0BOT")), "hello");
    }

    #[test]
    fn keeps_first_word_when_no_leading_mention() {
        assert_eq!(strip_mention("what is 2+2", None), "what is 2+2");
        assert_eq!(strip_mention("what is 2+2 <@U0BOT>", Some("U0BOT")), "what is 2+2 <@U0BOT>");
    }

    #[test]
    fn leaves_mentions_of_other_users_in_place() {
        assert_eq!(
            strip_mention("<@U0OTHER> can you check this", Some("U0BOT")),
            "<@U0OTHER> can you check this"
        );
    }

    #[test]
    fn mention_only_text_yields_empty_query() {
        assert_eq!(strip_mention("<@U0BOT>", Some("U0BOT")), "");
        assert_eq!(strip_mention("   ", None), "");
    }

    #[test]
    fn multiline_queries_survive_stripping() {
        assert_eq!(strip_mention("<@U0BOT>\nfirst line\nsecond", None), "first line\nsecond");
    }
}
