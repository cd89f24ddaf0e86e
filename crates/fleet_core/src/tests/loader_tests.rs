use super::*;
use crate::error::GatewayError;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Default, PartialEq)]
struct TwoSections {
    left: SectionState<Vec<u32>>,
    right: SectionState<String>,
}

#[tokio::test]
async fn bind_resets_view_and_advances_generation() {
    let loader = SectionedLoader::<TwoSections>::new();
    let first = loader.bind("2001").await;
    assert!(
        loader
            .update(first, |view| view.left = SectionState::Ready(vec![1, 2]))
            .await
    );

    let second = loader.bind("2002").await;
    assert!(second > first);
    assert_eq!(loader.snapshot().await, TwoSections::default());
    assert_eq!(loader.entity().await.as_deref(), Some("2002"));
    assert!(loader.is_current(second).await);
    assert!(!loader.is_current(first).await);
}

#[tokio::test]
async fn updates_for_superseded_generation_are_ignored() {
    let loader = SectionedLoader::<TwoSections>::new();
    let stale = loader.bind("A").await;
    let current = loader.bind("B").await;

    let applied = loader
        .update(stale, |view| view.right = SectionState::Ready("A".into()))
        .await;
    assert!(!applied);
    assert_eq!(loader.snapshot().await.right, SectionState::Idle);

    assert!(
        loader
            .update(current, |view| view.right = SectionState::Ready("B".into()))
            .await
    );
    assert_eq!(loader.snapshot().await.right.data().map(String::as_str), Some("B"));
}

#[tokio::test]
async fn failed_section_leaves_sibling_untouched() {
    let loader = SectionedLoader::<TwoSections>::new();
    let generation = loader.bind("2001").await;

    let left = loader.load_section(
        generation,
        "left",
        "left could not be loaded",
        |view| &mut view.left,
        async { Ok::<_, GatewayError>(vec![7, 8]) },
    );
    let right = loader.load_section(
        generation,
        "right",
        "right could not be loaded",
        |view| &mut view.right,
        async { Err::<String, _>(GatewayError::status("/right", 500, None)) },
    );
    let (left_applied, right_applied) = tokio::join!(left, right);
    assert!(left_applied && right_applied);

    let view = loader.snapshot().await;
    assert_eq!(view.left, SectionState::Ready(vec![7, 8]));
    assert_eq!(
        view.right.error(),
        Some("right could not be loaded (HTTP 500)")
    );
}

#[tokio::test]
async fn late_result_from_previous_binding_is_dropped() {
    let loader = SectionedLoader::<TwoSections>::new();
    let first = loader.bind("A").await;
    let (release_tx, release_rx) = oneshot::channel::<Vec<u32>>();

    let slow = loader.load_section(
        first,
        "left",
        "left could not be loaded",
        |view| &mut view.left,
        async move { Ok::<_, GatewayError>(release_rx.await.unwrap_or_default()) },
    );

    let rebind_then_release = async {
        tokio::task::yield_now().await;
        assert_eq!(loader.snapshot().await.left, SectionState::Loading);
        let second = loader.bind("B").await;
        release_tx.send(vec![1]).expect("release");
        second
    };

    let (applied, second) = tokio::join!(slow, rebind_then_release);
    assert!(!applied);
    assert!(loader.is_current(second).await);
    assert_eq!(loader.snapshot().await.left, SectionState::Idle);
}

#[test]
fn section_state_accessors() {
    let ready: SectionState<u8> = SectionState::Ready(3);
    assert_eq!(ready.status(), SectionStatus::Ready);
    assert_eq!(ready.data(), Some(&3));
    assert!(ready.is_settled());
    assert_eq!(ready.clone().map(|v| v * 2), SectionState::Ready(6));

    let failed: SectionState<u8> = SectionState::Failed("boom".into());
    assert_eq!(failed.error(), Some("boom"));
    assert_eq!(failed.data(), None);

    assert!(SectionState::<u8>::Loading.is_loading());
    assert_eq!(SectionState::<u8>::default().status(), SectionStatus::Idle);
}
