/*! Integration tests for pathdoc.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - document: end-to-end document building, decorator stacks, and cloning
 * - visit: the visitor-powered operations (copy, merge, equivalence,
 *   whitelist transforms)
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("pathdoc=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod document;
mod helpers;
mod visit;
