//! `$I` reset semantics: car state drops, subscribers get exactly one
//! reset.

use crate::prelude::*;

#[tokio::test]
async fn reset_empties_cars_and_notifies_once() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();

    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",52474,\"A\",\"Driver\",\"USA\",1"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$F,,,\"13:00:00.000\",,Green"))
        .await
        .unwrap();
    assert_eq!(f.pipeline.state().read(|s| s.car_positions.len()), 1);

    f.pipeline.handle(rmon(10, "$I")).await.unwrap();

    assert!(f.pipeline.state().read(|s| s.car_positions.is_empty()));
    assert_eq!(f.sink.reset_count(), 1);
}

#[tokio::test]
async fn cars_reappear_after_reset_with_full_patches() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",52474,\"A\",\"Driver\",\"USA\",1"))
        .await
        .unwrap();
    f.pipeline.handle(rmon(10, "$I")).await.unwrap();

    // The entry list re-arrives after the reset, rebuilding the car
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",52474,\"A\",\"Driver\",\"USA\",1"))
        .await
        .unwrap();
    assert_eq!(f.pipeline.state().read(|s| s.car_positions.len()), 1);
    assert_eq!(
        f.pipeline
            .state()
            .read(|s| s.car("42").unwrap().transponder_id),
        52474
    );
}
