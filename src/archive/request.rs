//! Validation of `archive` arguments and their resolution into a request.

pub const USAGE_ARGS: &str = "((metadata | participants | complete) | (text (reactions | stickers | attachments | threads)* | whole-messages) [messages-only])";

const RECOGNIZED: &[&str] = &[
    "metadata",
    "participants",
    "complete",
    "text",
    "reactions",
    "stickers",
    "attachments",
    "threads",
    "whole-messages",
    "messages-only",
];

/// Which optional parts of each message get captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capture {
    pub reactions: bool,
    pub stickers: bool,
    pub attachments: bool,
    pub threads: bool,
}

impl Capture {
    pub const ALL: Capture = Capture {
        reactions: true,
        stickers: true,
        attachments: true,
        threads: true,
    };
}

/// What one archive run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub metadata: bool,
    pub participants: bool,
    /// Message records are written to `messages_N.json` pages.
    pub messages: bool,
    pub capture: Capture,
}

impl ArchiveRequest {
    /// Whether the channel's history has to be walked at all.
    pub fn walks_history(&self) -> bool {
        self.messages || self.participants
    }

    /// Validates `args` and resolves them into a request.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, RequestError> {
        let args: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
        validate(&args)?;

        let messages_only = args.contains(&"messages-only");
        let request = match args[0] {
            "metadata" => Self {
                metadata: true,
                participants: false,
                messages: false,
                capture: Capture::default(),
            },
            "participants" => Self {
                metadata: false,
                participants: true,
                messages: false,
                capture: Capture {
                    reactions: true,
                    threads: true,
                    ..Capture::default()
                },
            },
            "complete" => Self {
                metadata: true,
                participants: true,
                messages: true,
                capture: Capture::ALL,
            },
            "whole-messages" => Self {
                metadata: !messages_only,
                participants: !messages_only,
                messages: true,
                capture: Capture::ALL,
            },
            _ => Self {
                metadata: !messages_only,
                participants: !messages_only,
                messages: true,
                capture: Capture {
                    reactions: args.contains(&"reactions"),
                    stickers: args.contains(&"stickers"),
                    attachments: args.contains(&"attachments"),
                    threads: args.contains(&"threads"),
                },
            },
        };

        Ok(request)
    }
}

/// Why a set of `archive` arguments was rejected.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RequestError {
    #[display("No argument provided.")]
    NoArguments,

    #[display("Unrecognized argument: {_0}")]
    Unrecognized(String),

    #[display(r#"Arguments "metadata", "participants", and "complete" can't be accompanied by other arguments."#)]
    Standalone,

    #[display(r#""text" or "whole-messages" must be specified before other arguments."#)]
    SelectionFirst,

    #[display(r#""text" and "whole-messages" are mutually exclusive."#)]
    TextAndWholeMessages,

    #[display(r#""whole-messages" can't have more than 1 argument."#)]
    WholeMessagesTooMany,

    #[display(r#""messages-only" is the only argument that can come after "whole-messages"."#)]
    WholeMessagesFollower,
}

fn validate(args: &[&str]) -> Result<(), RequestError> {
    let Some(&first) = args.first() else {
        return Err(RequestError::NoArguments);
    };

    if let Some(arg) = args.iter().find(|arg| !RECOGNIZED.contains(*arg)) {
        return Err(RequestError::Unrecognized(arg.to_string()));
    }

    let has = |word: &str| args.contains(&word);

    if has("metadata") || has("participants") || has("complete") {
        if args.len() != 1 {
            return Err(RequestError::Standalone);
        }
        return Ok(());
    }

    if first != "text" && first != "whole-messages" {
        return Err(RequestError::SelectionFirst);
    }

    if has("text") && has("whole-messages") {
        return Err(RequestError::TextAndWholeMessages);
    }

    if first == "whole-messages" && args.len() >= 2 {
        if args.len() > 2 {
            return Err(RequestError::WholeMessagesTooMany);
        }
        if args[1] != "messages-only" {
            return Err(RequestError::WholeMessagesFollower);
        }
    }

    Ok(())
}
