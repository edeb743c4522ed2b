use launderly_db::StandardCatalogSeed;

use crate::commands::{open_database, prepare, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;

        let seed_result = StandardCatalogSeed::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = StandardCatalogSeed::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<launderly_db::SeedResult, StepFailure> =
            if !verification.all_present {
                let failed_checks = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
                    .collect::<Vec<_>>();
                Err(("seed_verification", verification_failure_message(&failed_checks), 6u8))
            } else {
                Ok(seed_result)
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "standard catalog loaded: {} price list items, {} modifiers",
                seeded.price_items, seeded.modifiers
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_failure_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_failure_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let message =
            verification_failure_message(&["price:CLOTHING/Coat", "modifier:very_dirty_items"]);

        assert_eq!(
            message,
            "Seed verification failed for checks: price:CLOTHING/Coat, modifier:very_dirty_items"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_failure_message(&[]), "Some seed data failed to load");
    }
}
