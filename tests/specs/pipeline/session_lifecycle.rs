//! Session change, checkered finish and finalization.

use crate::prelude::*;
use pw_core::SessionId;

#[tokio::test]
async fn checkered_session_finalizes_after_sixty_event_seconds() {
    let mut f = fixture(1);
    let mut finalized = f.pipeline.subscribe_finalized();

    f.pipeline.handle(session_change(10, "Qual")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",52474,\"A\",\"Driver\",\"USA\",1"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$F,20,\"00:20:00\",\"12:40:00.000\",\"00:00:00.000\",Green"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$F,0,\"00:00:00\",\"13:00:00.000\",\"00:20:00.000\",Checkered"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$J,\"42\",\"00:02:00.000\",\"00:22:00.000\""))
        .await
        .unwrap();

    // Nothing finalizes while event time has not advanced far enough
    f.pipeline
        .handle(rmon(10, "$F,0,\"00:00:00\",\"13:00:30.000\",\"00:20:30.000\",Checkered"))
        .await
        .unwrap();
    assert!(f.store.finalized.lock().is_empty());

    // 60 s of event time past the last checkered-lap change
    f.pipeline
        .handle(rmon(10, "$F,0,\"00:00:00\",\"13:01:00.100\",\"00:21:00.000\",Checkered"))
        .await
        .unwrap();

    assert_eq!(f.store.finalized_sessions(), vec![SessionId::new(10)]);
    assert_eq!(finalized.try_recv().unwrap(), SessionId::new(10));

    // Session row side effects: not-live patch went out, result captured
    assert!(!f.pipeline.state().read(|s| s.is_live));
    let (_, terminal, _) = f.store.finalized.lock()[0].clone();
    assert_eq!(terminal.session_id, SessionId::new(10));
    assert!(terminal.car("42").is_some());
}

#[tokio::test]
async fn reserved_session_id_is_inert() {
    let mut f = fixture(1);
    f.pipeline
        .handle(session_change(pw_core::RESERVED_SESSION_ID, "Ghost"))
        .await
        .unwrap();

    assert!(f.pipeline.state().read(|s| !s.is_live));
    assert!(f.store.finalized.lock().is_empty());
}

#[tokio::test]
async fn adopting_a_new_session_finalizes_the_prior_one() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Qual")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$B,10,\"Qualifying\""))
        .await
        .unwrap();

    f.pipeline.handle(session_change(11, "Race")).await.unwrap();

    assert_eq!(f.store.finalized_sessions(), vec![SessionId::new(10)]);
    assert_eq!(f.pipeline.state().read(|s| s.session_id), SessionId::new(11));
    assert!(f.pipeline.state().read(|s| s.is_live));
}
