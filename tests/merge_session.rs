use std::sync::Arc;
use std::time::Duration;

use dictamerge::audio::MockAudioSource;
use dictamerge::buffer::{InMemoryBuffer, shared};
use dictamerge::channel::{ChannelEvent, ChannelMode, MockChannel, TranscriptEvent};
use dictamerge::session::{RecordingSession, SessionConfig, SessionStatus};
use dictamerge::SharedBuffer;

fn transcript(text: &str, is_final: bool) -> ChannelEvent {
    ChannelEvent::Transcript(TranscriptEvent::new(text, is_final))
}

fn value_of(buffer: &SharedBuffer) -> String {
    buffer.lock().unwrap().value()
}

fn selection_of(buffer: &SharedBuffer) -> Option<(usize, usize)> {
    buffer.lock().unwrap().selection()
}

fn streaming_session(
    source: MockAudioSource,
    channel: MockChannel,
) -> (RecordingSession, SharedBuffer) {
    let buffer = shared(InMemoryBuffer::new());
    let session = RecordingSession::new(
        SessionConfig::default(),
        Arc::clone(&buffer),
        Box::new(source),
        Box::new(channel),
    );
    (session, buffer)
}

fn batch_config() -> SessionConfig {
    SessionConfig {
        mode: ChannelMode::Batch,
        chunk_interval: Duration::from_millis(20),
        batch_grace: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn test_streaming_dictation_merges_interims_into_final() {
    let channel = MockChannel::new().with_events(vec![
        transcript("the", false),
        transcript("the lungs", false),
        transcript("the lungs are clear", false),
        transcript("The lungs are clear.", true),
    ]);
    let (mut session, buffer) = streaming_session(MockAudioSource::new(), channel);

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.stop().await.unwrap();

    assert_eq!(value_of(&buffer), "The lungs are clear.");
    assert_eq!(selection_of(&buffer), Some((20, 20)));
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn test_live_events_concatenate_consecutive_segments() {
    let channel = MockChannel::new();
    let inspector = channel.clone();
    let (mut session, buffer) = streaming_session(MockAudioSource::new(), channel);

    session.start().await.unwrap();
    inspector.push(transcript("first", false));
    inspector.push(transcript("first segment.", true));
    inspector.push(transcript("second", false));
    inspector.push(transcript("second segment.", true));
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.stop().await.unwrap();

    assert_eq!(value_of(&buffer), "First segment. Second segment.");
    assert!(!value_of(&buffer).contains("  "));
}

#[tokio::test]
async fn test_channel_error_mid_segment_preserves_finalized_text() {
    let channel = MockChannel::new().with_events(vec![
        transcript("first segment.", true),
        transcript("second", false),
        ChannelEvent::Error("connection dropped".to_string()),
    ]);
    let source = MockAudioSource::new();
    let device = source.clone();
    let (mut session, buffer) = streaming_session(source, channel);

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(session.status(), SessionStatus::Error);
    assert_eq!(session.last_error().unwrap(), "connection dropped");
    // The finalized segment survives; the merged interim is left as-is.
    assert_eq!(value_of(&buffer), "First segment. Second");
    assert!(!device.is_started());

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_dictation_replaces_existing_selection() {
    let buffer = shared(InMemoryBuffer::with_text("before old text after"));
    buffer.lock().unwrap().set_selection(7, 15);

    let channel = MockChannel::new().with_events(vec![transcript("new text", true)]);
    let mut session = RecordingSession::new(
        SessionConfig::default(),
        Arc::clone(&buffer),
        Box::new(MockAudioSource::new()),
        Box::new(channel),
    );

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.stop().await.unwrap();

    assert_eq!(value_of(&buffer), "before new text after");
    assert_eq!(selection_of(&buffer), Some((15, 15)));
}

#[tokio::test]
async fn test_double_stop_keeps_buffer_and_cursor() {
    let channel = MockChannel::new().with_events(vec![transcript("hello world", false)]);
    let (mut session, buffer) = streaming_session(MockAudioSource::new(), channel);

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.stop().await.unwrap();

    // The pending interim was finalized by the stop.
    assert_eq!(value_of(&buffer), "Hello world");
    let value = value_of(&buffer);
    let selection = selection_of(&buffer);

    session.stop().await.unwrap();
    assert_eq!(value_of(&buffer), value);
    assert_eq!(selection_of(&buffer), selection);
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn test_batch_session_records_then_merges_single_final() {
    let channel = MockChannel::new().with_stop_events(vec![
        transcript("Batch transcript.", true),
        ChannelEvent::Closed,
    ]);
    let inspector = channel.clone();
    let buffer = shared(InMemoryBuffer::new());
    let mut session = RecordingSession::new(
        batch_config(),
        Arc::clone(&buffer),
        Box::new(MockAudioSource::new()),
        Box::new(channel),
    );

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(70)).await;
    session.stop().await.unwrap();

    assert_eq!(value_of(&buffer), "Batch transcript.");
    assert_eq!(session.status(), SessionStatus::Idle);
    assert!(inspector.was_stopped());
    // Chunks were forwarded on the capture cadence while recording.
    assert!(!inspector.sent_chunks().is_empty());
}

#[tokio::test]
async fn test_batch_failure_leaves_buffer_unmodified() {
    let channel = MockChannel::new().with_stop_events(vec![
        ChannelEvent::Error("Batch transcription rejected: no speech".to_string()),
        ChannelEvent::Closed,
    ]);
    let buffer = shared(InMemoryBuffer::with_text("existing text"));
    let mut session = RecordingSession::new(
        batch_config(),
        Arc::clone(&buffer),
        Box::new(MockAudioSource::new()),
        Box::new(channel),
    );

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    session.stop().await.unwrap();

    assert_eq!(value_of(&buffer), "existing text");
    assert_eq!(session.status(), SessionStatus::Error);
    assert!(session.last_error().unwrap().contains("rejected"));
}

#[tokio::test]
async fn test_dropping_session_releases_device() {
    let source = MockAudioSource::new();
    let device = source.clone();

    {
        let (mut session, _buffer) = streaming_session(source, MockChannel::new());
        session.start().await.unwrap();
        assert!(device.is_started());
    }

    // Dropping the handle closes the control channel; the loop treats that
    // as a stop and winds down in the background.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!device.is_started());
}
