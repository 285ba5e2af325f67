// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
#![cfg(test)]

mod common;

use actor_bridge::{Policy, Registry, EXIT_UNEXPECTED};
use actor_bridge_encoding::{cid_of, to_vec};
use actor_bridge_runtime::channel::HostCall;
use actor_bridge_shared::builtin::Type;
use actor_bridge_shared::error::ExitCode;
use actor_bridge_shared::version::{ActorsVersion, NetworkVersion};
use common::*;
use log::LevelFilter;
use pretty_assertions::assert_eq;

const ALICE: u64 = 1000;
const BOB: u64 = 1001;

fn harness() -> Harness {
    let h = Harness::new(counter_registry());
    h.counter(ALICE, counter_code(), 5);
    h
}

#[test]
fn construct_increment_get() {
    let h = harness();
    assert_eq!(h.count(ALICE), 5);

    let resp = h.call(ALICE, Method::Increment, &3i64);
    assert_eq!(ret::<i64>(&resp), 8);
    assert_eq!(ret::<i64>(&h.call0(ALICE, Method::Get)), 8);
    assert_eq!(h.count(ALICE), 8);
    assert_eq!(h.host.world().commits, 2);

    // A unit return value comes back as no bytes.
    let resp = h.call(ALICE, Method::BurnGas, &1i64);
    assert_eq!(resp.exit_code, ExitCode::OK);
    assert!(resp.payload.is_empty());
}

#[test]
fn routing_failures() {
    let h = harness();
    h.host.add_actor(BOB, cid_of(b"not an actor"));
    let resp = h.call0(BOB, Method::Get);
    assert_eq!(resp.exit_code, ExitCode::SYS_ILLEGAL_ACTOR);

    for method in [0, 17, 1 << 40] {
        let resp = h.host.invoke(CALLER, ALICE, method, Vec::new());
        assert_eq!(resp.exit_code, ExitCode::SYS_INVALID_METHOD, "method {}", method);
        assert!(resp.message().unwrap().contains("no method"));
    }
    assert_eq!(h.host.calls_to(HostCall::StateGet), 0);
}

#[test]
fn malformed_invoke_request_is_fatal() {
    let h = harness();
    let resp = actor_bridge::InvokeResponse::decode(&h.dispatcher.invoke_raw(&[0x01, 0x02]))
        .unwrap();
    assert_eq!(resp.exit_code, ExitCode::FATAL);
}

#[test]
fn reentrant_sends() {
    let h = harness();
    h.counter(BOB, counter_code(), 0);

    // Alice -> Bob -> Alice: the innermost frame updates Alice while her outer frame waits.
    let resp = h.call(
        ALICE,
        Method::Forward,
        &ForwardParams {
            hops: vec![BOB, ALICE],
            by: 10,
        },
    );
    assert_eq!(ret::<i64>(&resp), 15);
    assert_eq!(h.count(ALICE), 15);
    assert_eq!(h.count(BOB), 0);

    // Four frames deep.
    let resp = h.call(
        ALICE,
        Method::Forward,
        &ForwardParams {
            hops: vec![BOB, ALICE, BOB],
            by: 2,
        },
    );
    assert_eq!(ret::<i64>(&resp), 2);
    assert_eq!(h.count(BOB), 2);
    assert_eq!(h.count(ALICE), 15);
    assert!(h.host.world().frames.is_empty());
}

#[test]
fn callee_failure_propagates() {
    let h = harness();
    // Bob exists but was never constructed, so he has no state to update.
    h.host.add_actor(BOB, counter_code());
    let resp = h.call(
        ALICE,
        Method::Forward,
        &ForwardParams {
            hops: vec![BOB],
            by: 1,
        },
    );
    assert_eq!(resp.exit_code, ExitCode::SYS_ILLEGAL_ACTOR);

    let resp = h.call(
        ALICE,
        Method::Forward,
        &ForwardParams {
            hops: vec![4242],
            by: 1,
        },
    );
    assert_eq!(resp.exit_code, ExitCode::SYS_INVALID_RECEIVER);
    assert_eq!(h.count(ALICE), 5);
}

#[test]
fn transactions_are_atomic() {
    let h = harness();
    let commits = h.host.world().commits;

    let resp = h.call0(ALICE, Method::MutateThenAbort);
    assert_eq!(resp.exit_code, ExitCode::USR_ILLEGAL_STATE);
    assert_eq!(resp.message().as_deref(), Some("changed my mind"));
    assert_eq!(h.count(ALICE), 5);
    assert_eq!(h.host.world().commits, commits);

    let resp = h.call0(ALICE, Method::SendInTransaction);
    assert_eq!(resp.exit_code, ExitCode::SYS_ILLEGAL_ACTOR);
    assert_eq!(h.host.calls_to(HostCall::Send), 0);
    assert_eq!(h.count(ALICE), 5);
    assert_eq!(h.host.world().commits, commits);
}

#[test]
fn state_is_untouched_until_the_caller_is_validated() {
    let h = harness();
    let commits = h.host.world().commits;
    for method in [Method::TransactBeforeValidation, Method::CreateBeforeValidation] {
        let resp = h.call0(ALICE, method);
        assert_eq!(resp.exit_code, ExitCode::SYS_ILLEGAL_ACTOR, "{:?}", method);
        assert_eq!(resp.message().as_deref(), Some("caller not validated"));
    }
    assert_eq!(h.host.world().commits, commits);
    assert_eq!(h.host.calls_to(HostCall::StateCommit), commits);
    assert_eq!(h.host.calls_to(HostCall::StateGet), 0);
    assert_eq!(h.count(ALICE), 5);
}

#[test]
fn construct_then_get() {
    let mut registry = Registry::new();
    registry.register::<RecordActor>(record_code()).unwrap();
    let h = Harness::new(registry);
    h.host.add_actor(ALICE, record_code());

    // Reading before construction finds no state.
    let resp = h.host.invoke(CALLER, ALICE, 1, Vec::new());
    assert_eq!(resp.exit_code, ExitCode::SYS_ILLEGAL_ARGUMENT);
    assert_eq!(h.host.world().commits, 0);

    let resp = h.host.invoke(CALLER, ALICE, 0, Vec::new());
    assert_eq!(resp.exit_code, ExitCode::OK);
    assert!(resp.payload.is_empty());
    let resp = h.host.invoke(CALLER, ALICE, 1, Vec::new());
    assert_eq!(ret::<Record>(&resp), Record::default());

    let resp = h.host.invoke(CALLER, ALICE, 2, Vec::new());
    assert_eq!(resp.exit_code, ExitCode::SYS_INVALID_METHOD);
    assert_eq!(h.host.world().commits, 1);
}

#[test]
fn caller_validated_exactly_once() {
    let h = harness();
    let resp = h.call0(ALICE, Method::SkipValidation);
    assert_eq!(resp.exit_code, ExitCode::SYS_ILLEGAL_ACTOR);
    let resp = h.call0(ALICE, Method::ValidateTwice);
    assert_eq!(resp.exit_code, ExitCode::SYS_ILLEGAL_ACTOR);
}

#[test]
fn panics_and_success_aborts() {
    let h = harness();
    let resp = h.call0(ALICE, Method::Panic);
    assert_eq!(resp.exit_code, EXIT_UNEXPECTED);
    assert!(resp.message().unwrap().contains("counter exploded"));

    let resp = h.call0(ALICE, Method::AbortOk);
    assert_eq!(resp.exit_code, ExitCode::SYS_ILLEGAL_ACTOR);

    // The bridge keeps serving.
    assert_eq!(ret::<i64>(&h.call0(ALICE, Method::Get)), 5);
}

#[test]
fn host_aborts_reach_the_actor() {
    let h = harness();
    h.host.world_mut().gas_limit = 10;
    assert_eq!(h.call(ALICE, Method::BurnGas, &6i64).exit_code, ExitCode::OK);
    assert_eq!(
        h.call(ALICE, Method::BurnGas, &6i64).exit_code,
        ExitCode::SYS_OUT_OF_GAS
    );
}

#[test]
fn rejected_signature() {
    let h = harness();
    let params = SignatureParams {
        signer: BOB,
        signature: vec![7; 65],
        data: b"hello".to_vec(),
    };
    assert_eq!(
        h.call(ALICE, Method::CheckSignature, &params).exit_code,
        ExitCode::OK
    );
    h.host.world_mut().signatures_valid = false;
    let resp = h.call(ALICE, Method::CheckSignature, &params);
    assert_eq!(resp.exit_code, ExitCode::USR_ILLEGAL_ARGUMENT);
    assert!(resp.message().unwrap().contains("invalid signature"));
}

#[test]
fn singletons_cannot_be_created() {
    let h = harness();
    let resp = h.call0(ALICE, Method::CreateSingleton);
    assert_eq!(resp.exit_code, ExitCode::SYS_ILLEGAL_ARGUMENT);
    assert_eq!(h.host.calls_to(HostCall::CreateActor), 0);
}

#[test]
fn logs_are_filtered_before_the_host() {
    let h = harness();
    assert_eq!(
        h.call(ALICE, Method::Log, &"hello".to_string()).exit_code,
        ExitCode::OK
    );
    assert_eq!(h.host.world().logs, vec![(3, "hello".to_string())]);

    let h = Harness::with_policy(
        counter_registry(),
        Policy::default().with_log_level(LevelFilter::Debug),
    );
    h.counter(ALICE, counter_code(), 0);
    h.call(ALICE, Method::Log, &"hello".to_string());
    assert_eq!(
        h.host.world().logs,
        vec![(4, "hello".to_string()), (3, "hello".to_string())]
    );

    // Actors of the second generation have no log to write to.
    let v2 = Type::Multisig.code_id(ActorsVersion::V2);
    h.counter(BOB, v2, 0);
    h.call(BOB, Method::Log, &"quiet".to_string());
    assert_eq!(h.host.world().logs.len(), 2);
}

#[test]
fn parameter_errors_follow_the_code_generation() {
    let h = Harness::new(counter_registry());
    let v2 = Type::Multisig.code_id(ActorsVersion::V2);
    let v5 = Type::Multisig.code_id(ActorsVersion::V5);
    for (id, code) in [(1, v2), (2, v5), (3, counter_code())] {
        h.counter(id, code, 0);
    }
    let garbage = vec![0xff];
    let exit = |id| {
        h.host
            .invoke(CALLER, id, Method::Increment as u64, garbage.clone())
            .exit_code
    };
    assert_eq!(exit(1), ExitCode::new(1));
    assert_eq!(exit(2), ExitCode::USR_SERIALIZATION);
    assert_eq!(exit(3), ExitCode::USR_SERIALIZATION);

    // Custom code follows the network: the oldest networks also use the oldest codes.
    h.host.world_mut().network_version = NetworkVersion::V3;
    assert_eq!(exit(3), ExitCode::new(1));
    assert_eq!(exit(2), ExitCode::USR_SERIALIZATION);

    // Well-formed parameters of the wrong shape are also decode failures.
    h.host.world_mut().network_version = NetworkVersion::V13;
    let resp = h
        .host
        .invoke(CALLER, 2, Method::Increment as u64, to_vec(&"three").unwrap());
    assert_eq!(resp.exit_code, ExitCode::USR_SERIALIZATION);
}
