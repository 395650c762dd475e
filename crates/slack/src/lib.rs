//! Slack Integration - Events API ingress and Web API replies
//!
//! This crate provides the Slack side of askbot:
//! - **Events** (`events`) - parse Events API callbacks, normalize `app_mention`
//! - **Signatures** (`signature`) - verify `X-Slack-Signature` request signing
//! - **Client** (`client`) - `chat.postMessage` / `reactions.add` behind `ChatClient`
//! - **Replies** (`reply`) - thread routing, error replies, acknowledgments
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Enable Event Subscriptions pointing at `https://<host>/slack/events`
//!    and subscribe to the `app_mention` bot event
//! 3. Grant `app_mentions:read`, `chat:write`, `reactions:write`
//! 4. Set env vars: `ASKBOT_SLACK_BOT_TOKEN`, `ASKBOT_SLACK_SIGNING_SECRET`
//!
//! # Architecture
//!
//! ```text
//! Slack callback → parse_callback → InboundEvent → (work queue)
//!                                                      ↓
//!                 ReplyDispatcher → ChatClient ← ReplyOutcome
//! ```

pub mod client;
pub mod events;
pub mod reply;
pub mod signature;

pub use client::{BotIdentity, ChatCall, ChatClient, ChatError, MemoryChatClient, SlackWebClient};
pub use events::{parse_callback, NormalizationError, SlackCallback};
pub use reply::ReplyDispatcher;
