//! Protected publication scenarios.

use std::io::{Read, Seek};

use lcpt_publication::Publication;

use crate::checks::publication as checks;
use crate::error::SetupError;
use crate::report::ScenarioRun;

use super::{license_checks, loan_checks, Context};

/// `publication`.
pub(crate) fn archive(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let mut publication = Publication::open(ctx.epub()?)?;
    publication_checks(&mut publication, run)
}

/// `publication.license`.
pub(crate) async fn embedded_license(
    ctx: &Context<'_>,
    run: &mut ScenarioRun,
) -> Result<(), SetupError> {
    let license = Publication::open(ctx.epub()?)?.license()?;
    license_checks(ctx.harness, &license, ctx.passphrase(), run).await;
    if license.is_loan() {
        loan_checks(&license, run);
    }
    Ok(())
}

/// Archive and `encryption.xml` checks. A malformed manifest aborts.
pub(crate) fn publication_checks<R: Read + Seek>(
    publication: &mut Publication<R>,
    run: &mut ScenarioRun,
) -> Result<(), SetupError> {
    if run.record("encryption.xml present", checks::encryption_present(publication)) {
        let encryption = publication.encryption()?;
        run.record("encryption.xml structure", checks::encryption_structure(&encryption));
        run.record(
            "encrypted resources present",
            checks::resources_present(publication, &encryption),
        );
        run.record(
            "allowlisted files not encrypted",
            checks::allowlist_in_clear(publication, &encryption),
        );
        run.record(
            "media resources not compressed",
            checks::media_uncompressed(publication, &encryption),
        );
    }
    run.record("license present", checks::license_present(publication));
    Ok(())
}
