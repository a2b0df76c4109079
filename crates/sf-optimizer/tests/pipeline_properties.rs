use async_trait::async_trait;
use sf_core::{
    Entry, GatewayError, OptimizerConfig, Phase, ShortenRequest, Shortener, Shortening, SubFitError, Timestamp,
};
use sf_optimizer::SubtitlePipeline;
use sf_srt::{SrtFormat, SubtitleFormat};
use std::collections::HashSet;

const SAMPLE: &str = "1
00:00:01,000 --> 00:00:02,000
Um, I think we should leave before it gets dark.

2
00:00:02,000 --> 00:00:02,900
Why?

3
00:00:05,000 --> 00:00:05,800
Because the bridge closes at nine and we still need fuel.

4
00:00:05,800 --> 00:00:06,600
Right.

5
00:00:06,600 --> 00:00:07,400
Nobody told me anything about a bridge closing tonight.

6
00:00:07,400 --> 00:00:08,200
Then how were we supposed to get across the river at all?

7
00:00:12,000 --> 00:00:15,000
- Uh.
- Ballpark figure?
";

fn parse(text: &str) -> Vec<Entry> {
    SrtFormat::new().parse_content(text).unwrap()
}

fn pipeline() -> SubtitlePipeline {
    SubtitlePipeline::new(OptimizerConfig::default()).unwrap()
}

fn timing_and_text(entries: &[Entry]) -> Vec<(u64, u64, Vec<String>)> {
    entries.iter().map(|e| (e.start.as_millis(), e.end.as_millis(), e.lines.clone())).collect()
}

/// Truncates every request to its budget, failing on `fail` indices.
struct Truncator {
    fail: HashSet<usize>,
}

#[async_trait]
impl Shortener for Truncator {
    fn name(&self) -> &str {
        "truncator"
    }

    async fn shorten(&self, request: &ShortenRequest) -> Result<Shortening, GatewayError> {
        if self.fail.contains(&request.index) {
            return Err(GatewayError::Unavailable("offline".into()));
        }
        let text: String = request.text.chars().take(request.char_budget).collect();
        Ok(Shortening::Shortened(text.trim().to_string()))
    }
}

/// Replies with text longer than the original.
struct Verbose;

#[async_trait]
impl Shortener for Verbose {
    fn name(&self) -> &str {
        "verbose"
    }

    async fn shorten(&self, request: &ShortenRequest) -> Result<Shortening, GatewayError> {
        Ok(Shortening::Shortened(format!("{} and then some", request.text)))
    }
}

/// Replies with the same text for every request.
struct Fixed(&'static str);

#[async_trait]
impl Shortener for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn shorten(&self, _request: &ShortenRequest) -> Result<Shortening, GatewayError> {
        Ok(Shortening::Shortened(self.0.to_string()))
    }
}

fn lone_dense_entry() -> Vec<Entry> {
    vec![Entry::from_text(1, Timestamp::ZERO, Timestamp::from_millis(1_000), &"x".repeat(42))]
}

// ========== Invariants ==========

#[test]
fn test_no_overlap_and_valid_timing() {
    let result = pipeline().run_local(parse(SAMPLE));
    for e in &result.entries {
        assert!(e.start <= e.end);
        assert!(e.line_count() <= 2);
    }
    for pair in result.entries.windows(2) {
        assert!(pair[0].end <= pair[1].start, "{} overlaps {}", pair[0].index, pair[1].index);
    }
    for (i, e) in result.entries.iter().enumerate() {
        assert_eq!(e.index, i + 1);
    }
}

#[test]
fn test_unresolved_match_entries_over_target() {
    let result = pipeline().run_local(parse(SAMPLE));
    let over: Vec<usize> = result.entries.iter().filter(|e| e.exceeds_cps(21.0)).map(|e| e.index).collect();
    let listed: Vec<usize> = result.unresolved.iter().map(|r| r.index).collect();
    assert_eq!(over, listed);
    assert!(!result.is_fully_resolved());
}

#[test]
fn test_fillers_removed_from_sample() {
    let result = pipeline().run_local(parse(SAMPLE));
    let texts: Vec<String> = result.entries.iter().map(|e| e.text()).collect();
    assert!(texts.iter().any(|t| t.starts_with("I think we should leave")));
    assert_eq!(texts.last().map(String::as_str), Some("Ballpark figure?"));
    assert!(result.changes.iter().any(|c| c.phase == Phase::Fillers));
}

#[test]
fn test_pipeline_is_idempotent() {
    let p = pipeline();
    let first = p.run_local(parse(SAMPLE));
    let second = p.run_local(first.entries.clone());
    assert_eq!(timing_and_text(&first.entries), timing_and_text(&second.entries));
    assert_eq!(second.counts.extended, 0);
    assert_eq!(second.counts.merged, 0);
    assert_eq!(second.counts.fillers_removed, 0);
}

#[test]
fn test_already_compliant_input_unchanged() {
    let input = "1\n00:00:01,000 --> 00:00:03,000\nHello there.\n\n2\n00:00:04,000 --> 00:00:06,000\nGeneral Kenobi.\n";
    let result = pipeline().run_local(parse(input));
    assert!(result.changes.is_empty());
    assert_eq!(SrtFormat::new().serialize(&result.entries), input);
}

#[test]
fn test_empty_input() {
    let result = pipeline().run_local(Vec::new());
    assert!(result.entries.is_empty());
    assert!(result.unresolved.is_empty());
}

// ========== Gateway round-trip ==========

#[tokio::test]
async fn test_shortening_resolves_every_entry() {
    let p = pipeline();
    let local = p.run_local(parse(SAMPLE));
    assert!(!local.unresolved.is_empty());

    let gateway = Truncator { fail: HashSet::new() };
    let indices: Vec<usize> = local.unresolved.iter().map(|r| r.index).collect();
    let resumed = p.resume(local.entries.clone(), &indices, &gateway).await.unwrap();

    assert!(resumed.is_fully_resolved(), "left: {:?}", resumed.unresolved);
    assert_eq!(resumed.entries.len(), local.entries.len());
    assert_eq!(resumed.counts.shortened, indices.len());
    for (before, after) in local.entries.iter().zip(&resumed.entries) {
        assert_eq!(before.start, after.start);
        assert_eq!(before.end, after.end);
    }
}

#[tokio::test]
async fn test_run_with_gateway_matches_resume() {
    let p = pipeline();
    let gateway = Truncator { fail: HashSet::new() };
    let direct = p.run(parse(SAMPLE), Some(&gateway as &dyn Shortener)).await;

    let local = p.run_local(parse(SAMPLE));
    let indices: Vec<usize> = local.unresolved.iter().map(|r| r.index).collect();
    let resumed = p.resume(local.entries, &indices, &gateway).await.unwrap();

    assert_eq!(timing_and_text(&direct.entries), timing_and_text(&resumed.entries));
}

#[tokio::test]
async fn test_partial_gateway_failure() {
    let p = pipeline();
    let local = p.run_local(parse(SAMPLE));
    let failing = local.unresolved[0].index;
    let gateway = Truncator { fail: HashSet::from([failing]) };
    let indices: Vec<usize> = local.unresolved.iter().map(|r| r.index).collect();

    let resumed = p.resume(local.entries.clone(), &indices, &gateway).await.unwrap();
    assert_eq!(resumed.counts.gateway_failures, 1);
    assert_eq!(resumed.unresolved.len(), 1);
    assert_eq!(resumed.unresolved[0].index, failing);
    assert_eq!(resumed.entries[failing - 1].lines, local.entries[failing - 1].lines);
}

#[tokio::test]
async fn test_longer_reply_rejected() {
    let p = pipeline();
    let local = p.run_local(parse(SAMPLE));
    let indices: Vec<usize> = local.unresolved.iter().map(|r| r.index).collect();
    let resumed = p.resume(local.entries.clone(), &indices, &Verbose).await.unwrap();
    assert_eq!(timing_and_text(&resumed.entries), timing_and_text(&local.entries));
    assert_eq!(resumed.counts.shortened, 0);
    assert_eq!(resumed.unresolved.len(), local.unresolved.len());
}

#[tokio::test]
async fn test_resume_unknown_index() {
    let p = pipeline();
    let local = p.run_local(parse(SAMPLE));
    let err = p.resume(local.entries, &[999], &Verbose).await.unwrap_err();
    assert!(matches!(err, SubFitError::ManifestMismatch(_)));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_resume_without_requests_is_noop() {
    let p = pipeline();
    let local = p.run_local(parse(SAMPLE));
    let resumed = p.resume(local.entries.clone(), &[], &Verbose).await.unwrap();
    assert_eq!(timing_and_text(&resumed.entries), timing_and_text(&local.entries));
    assert!(resumed.changes.is_empty());
}

#[tokio::test]
async fn test_three_line_reply_at_budget_resolves() {
    let p = pipeline();
    let local = p.run_local(lone_dense_entry());
    assert_eq!(local.unresolved[0].char_budget, 21);

    let reply = "Not now\nnot here\nnope";
    assert_eq!(reply.chars().count(), 21);
    let resumed = p.resume(local.entries, &[1], &Fixed(reply)).await.unwrap();
    assert!(resumed.is_fully_resolved(), "left: {:?}", resumed.unresolved);
    assert_eq!(resumed.entries[0].lines, vec!["Not now not here".to_string(), "nope".to_string()]);
    assert_eq!(resumed.entries[0].char_count(), 20);
}

#[tokio::test]
async fn test_reply_measured_after_fitting_lines() {
    let p = pipeline();
    let local = p.run_local(lone_dense_entry());
    // 21 characters without the breaks; joining the third line adds one.
    let resumed = p.resume(local.entries, &[1], &Fixed("Not now\nnot here\nnope!!")).await.unwrap();
    assert_eq!(resumed.counts.shortened, 1);
    assert_eq!(resumed.entries[0].line_count(), 2);
    assert_eq!(resumed.entries[0].char_count(), 22);
    assert_eq!(resumed.unresolved.len(), 1);
    assert_eq!(resumed.unresolved[0].char_budget, 21);
}
