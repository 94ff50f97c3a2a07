//! Chat message parsing.

/// What a text message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    /// `/rename <name>`; `None` when the name is missing.
    Rename(Option<String>),
    /// `/setthumb`, sent as a reply to a photo.
    SetThumb,
    /// `/clear` drops the pending rename and the thumbnail.
    Clear,
    Url(String),
    /// Plain text that is not an http(s) URL.
    NotAUrl,
    Unknown(String),
}

pub const WELCOME: &str = "\
Send me a direct file URL or a Google Drive link and I'll upload it here.

Commands:
/rename newfilename.ext - rename the next upload
/setthumb - reply to a photo to use it as the document thumbnail
/clear - forget the pending rename and the thumbnail";

pub fn parse_command(text: &str) -> BotCommand {
    let text = text.trim();

    let Some(command) = text.strip_prefix('/') else {
        return if text.starts_with("http://") || text.starts_with("https://") {
            BotCommand::Url(text.to_string())
        } else {
            BotCommand::NotAUrl
        };
    };

    let (word, rest) = command
        .split_once(char::is_whitespace)
        .unwrap_or((command, ""));
    // `/rename@uplink_bot` in group chats
    let word = word.split('@').next().unwrap_or(word);

    match word {
        "start" | "help" => BotCommand::Start,
        "rename" => {
            let name = rest.trim();
            BotCommand::Rename((!name.is_empty()).then(|| name.to_string()))
        }
        "setthumb" => BotCommand::SetThumb,
        "clear" => BotCommand::Clear,
        other => BotCommand::Unknown(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert_eq!(
            parse_command("  https://example.com/a.zip \n"),
            BotCommand::Url("https://example.com/a.zip".to_string())
        );
        assert_eq!(
            parse_command("http://example.com"),
            BotCommand::Url("http://example.com".to_string())
        );
        assert_eq!(parse_command("ftp://example.com/a"), BotCommand::NotAUrl);
        assert_eq!(parse_command("hello"), BotCommand::NotAUrl);
    }

    #[test]
    fn test_rename() {
        assert_eq!(
            parse_command("/rename holiday video.mkv"),
            BotCommand::Rename(Some("holiday video.mkv".to_string()))
        );
        assert_eq!(parse_command("/rename"), BotCommand::Rename(None));
        assert_eq!(parse_command("/rename   "), BotCommand::Rename(None));
        assert_eq!(
            parse_command("/rename@uplink_bot a.zip"),
            BotCommand::Rename(Some("a.zip".to_string()))
        );
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(parse_command("/start"), BotCommand::Start);
        assert_eq!(parse_command("/help"), BotCommand::Start);
        assert_eq!(parse_command("/setthumb"), BotCommand::SetThumb);
        assert_eq!(parse_command("/clear"), BotCommand::Clear);
        assert_eq!(
            parse_command("/stats"),
            BotCommand::Unknown("stats".to_string())
        );
    }
}
