// crates/repost-conformance-runner/src/context.rs
// ============================================================================
// Module: Harness Context
// Description: Per-run state shared by every scenario step.
// Purpose: Own the tester, its counter, and the seeded token generator.
// Dependencies: repost-conformance-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! A [`HarnessContext`] is created for each run and passed by mutable
//! reference through the scenario. Besides forwarding test cases it offers
//! the listing-membership and login helpers the scenarios share.
//! Invariants:
//! - Nothing here is process-global; two contexts never share state.

use std::sync::Arc;

use repost_conformance_core::Entity;
use repost_conformance_core::TokenGenerator;
use repost_conformance_core::User;
use reqwest::StatusCode;
use serde_json::Value;

use crate::auth::AccessToken;
use crate::auth::login_form;
use crate::auth::login_form_with;
use crate::contract::LOGIN_REJECTED_STATUS;
use crate::endpoint::Endpoint;
use crate::error::HarnessError;
use crate::error::HarnessResult;
use crate::log::RunEvent;
use crate::log::RunLog;
use crate::tester::RequestTester;
use crate::tester::TestCase;

/// Mutable state of one conformance run.
pub struct HarnessContext {
    /// Request tester holding the executed counter.
    tester: RequestTester,
    /// Random token source for new entities.
    tokens: TokenGenerator,
    /// Event sink for step labels.
    log: Arc<dyn RunLog>,
}

impl HarnessContext {
    /// Creates a context for one run.
    #[must_use]
    pub fn new(tester: RequestTester, tokens: TokenGenerator, log: Arc<dyn RunLog>) -> Self {
        Self {
            tester,
            tokens,
            log,
        }
    }

    /// Records the start of a scenario step.
    pub fn step(&self, label: impl Into<String>) {
        self.log.record(&RunEvent::Step {
            label: label.into(),
        });
    }

    /// Runs one test case.
    ///
    /// # Errors
    ///
    /// See [`RequestTester::test`].
    pub fn test(&mut self, case: TestCase<'_>) -> HarnessResult<Option<Value>> {
        self.tester.test(case)
    }

    /// Returns the number of executions so far.
    #[must_use]
    pub const fn test_count(&self) -> u64 {
        self.tester.executed()
    }

    /// Returns the token generator for constructing entities.
    pub const fn tokens(&mut self) -> &mut TokenGenerator {
        &mut self.tokens
    }

    /// Fetches a listing endpoint, requiring 200 and a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NotAList`] when the body is not an array.
    pub fn listing(&mut self, endpoint: Endpoint) -> HarnessResult<Vec<Value>> {
        let path = self.tester.path(&endpoint);
        match self.test(TestCase::get(endpoint, StatusCode::OK))? {
            Some(Value::Array(items)) => Ok(items),
            other => Err(HarnessError::NotAList {
                path,
                actual: other.unwrap_or(Value::Null),
            }),
        }
    }

    /// Requires at least one item in the listing to match `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::MissingFromListing`] when no item matches.
    pub fn expect_listed<E: Entity>(&mut self, endpoint: Endpoint, entity: &E) -> HarnessResult<()> {
        let path = self.tester.path(&endpoint);
        let items = self.listing(endpoint)?;
        if items.iter().any(|item| entity.matches(item)) {
            Ok(())
        } else {
            Err(HarnessError::MissingFromListing {
                path,
                kind: E::KIND,
                expected: entity.snapshot(),
            })
        }
    }

    /// Requires no item in the listing to match `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::StillListed`] when an item matches.
    pub fn expect_not_listed<E: Entity>(
        &mut self,
        endpoint: Endpoint,
        entity: &E,
    ) -> HarnessResult<()> {
        let path = self.tester.path(&endpoint);
        let items = self.listing(endpoint)?;
        if items.iter().any(|item| entity.matches(item)) {
            Err(HarnessError::StillListed {
                path,
                kind: E::KIND,
                expected: entity.snapshot(),
            })
        } else {
            Ok(())
        }
    }

    /// Logs `user` in and returns the issued token.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::MissingAccessToken`] when the response has no
    /// usable `access_token`.
    pub fn login(&mut self, user: &User) -> HarnessResult<AccessToken> {
        let path = self.tester.path(&Endpoint::Token);
        let response =
            self.test(TestCase::post(Endpoint::Token, StatusCode::OK).body(login_form(user)))?;
        let body = response.unwrap_or(Value::Null);
        match serde_json::from_value::<AccessToken>(body.clone()) {
            Ok(token) if !token.value().is_empty() => Ok(token),
            _ => Err(HarnessError::MissingAccessToken {
                path,
                body: body.to_string(),
            }),
        }
    }

    /// Requires a login with the given credentials to be rejected.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the login is not rejected.
    pub fn expect_login_rejected(&mut self, username: &str, password: &str) -> HarnessResult<()> {
        self.test(
            TestCase::post(Endpoint::Token, LOGIN_REJECTED_STATUS)
                .body(login_form_with(username, password)),
        )?;
        Ok(())
    }
}
