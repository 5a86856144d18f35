use booking_earnings::db::{init_db, NewBooking, NewVenue};
use booking_earnings::domain::{
    BookingId, BookingStatus, Currency, EarningType, Rate, TimeMs, UserId,
};
use booking_earnings::engine::{EarningsEngine, PlatformRates, PromotionWindow};
use booking_earnings::{BookingCalculationService, Repository};
use std::sync::Arc;
use tempfile::TempDir;

const PROMO_START: i64 = 1_735_689_600_000; // 2025-01-01T00:00:00Z
const PROMO_END: i64 = 1_738_367_999_000; // 2025-01-31T23:59:59Z
const OUTSIDE_PROMO: i64 = 1_717_200_000_000; // 2024-06-01T00:00:00Z

struct TestEnv {
    service: BookingCalculationService,
    repo: Arc<Repository>,
    venue_user: UserId,
    concierge_user: UserId,
    partner_user: UserId,
    concierge_id: i64,
    partner_id: i64,
    _temp: TempDir,
}

async fn setup() -> TestEnv {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let venue_user = repo.insert_user("Venue Operator").await.unwrap();
    let concierge_user = repo.insert_user("Concierge").await.unwrap();
    let partner_user = repo.insert_user("Partner").await.unwrap();
    let concierge_id = repo
        .insert_concierge(concierge_user, Some(pct("10")))
        .await
        .unwrap();
    let partner_id = repo
        .insert_partner(partner_user, Some(pct("6")))
        .await
        .unwrap();

    let engine = EarningsEngine::new(
        PlatformRates::default(),
        PromotionWindow::new(TimeMs::new(PROMO_START), TimeMs::new(PROMO_END)),
    );

    TestEnv {
        service: BookingCalculationService::new(repo.clone(), engine),
        repo,
        venue_user,
        concierge_user,
        partner_user,
        concierge_id,
        partner_id,
        _temp: temp_dir,
    }
}

fn pct(s: &str) -> Rate {
    Rate::parse_percent(s).unwrap()
}

async fn venue(env: &TestEnv, payout: &str) -> i64 {
    env.repo
        .insert_venue(
            env.venue_user,
            &NewVenue {
                name: "Venue".to_string(),
                payout_venue: Some(pct(payout)),
                non_prime_fee_per_head: Some(10),
                prime_fee_per_head: Some(10000),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

fn prime(venue_id: i64, concierge_id: i64, total_fee: i64, booking_at: i64) -> NewBooking {
    NewBooking {
        venue_id,
        concierge_id,
        partner_venue_id: None,
        partner_concierge_id: None,
        guest_count: 2,
        currency: Currency::usd(),
        total_fee,
        is_prime: true,
        status: BookingStatus::Confirmed,
        booking_at: Some(TimeMs::new(booking_at)),
    }
}

/// Persisted aggregates must match the persisted ledger line by line.
async fn assert_aggregates_match_ledger(env: &TestEnv, id: BookingId) {
    let booking = env.repo.get_booking(id).await.unwrap().unwrap();
    let earnings = env.repo.earnings_for_booking(id).await.unwrap();
    let sum = |types: &[EarningType]| -> i64 {
        earnings
            .iter()
            .filter(|e| types.contains(&e.earning_type))
            .map(|e| e.amount)
            .sum()
    };

    let agg = booking.aggregates;
    assert_eq!(
        agg.venue_earnings,
        sum(&[EarningType::Venue, EarningType::VenuePaid])
    );
    assert_eq!(
        agg.concierge_earnings,
        sum(&[EarningType::Concierge, EarningType::ConciergeBounty])
    );
    assert_eq!(agg.partner_venue_earnings, sum(&[EarningType::PartnerVenue]));
    assert_eq!(
        agg.partner_concierge_earnings,
        sum(&[EarningType::PartnerConcierge])
    );
    assert!(earnings.iter().all(|e| e.amount != 0));
}

#[tokio::test]
async fn test_venue_and_concierge_percentages() {
    let env = setup().await;
    let venue_id = venue(&env, "60").await;
    let id = env
        .repo
        .insert_booking(&prime(venue_id, env.concierge_id, 20000, OUTSIDE_PROMO))
        .await
        .unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();

    let earnings = env.repo.earnings_for_booking(id).await.unwrap();
    assert_eq!(earnings.len(), 2);
    let venue_line = earnings
        .iter()
        .find(|e| e.earning_type == EarningType::Venue)
        .unwrap();
    assert_eq!(venue_line.amount, 12000);
    assert_eq!(venue_line.user_id, env.venue_user);
    let concierge_line = earnings
        .iter()
        .find(|e| e.earning_type == EarningType::Concierge)
        .unwrap();
    assert_eq!(concierge_line.amount, 2000);
    assert_eq!(concierge_line.user_id, env.concierge_user);

    assert_eq!(outcome.booking.aggregates.platform_earnings, 6000);
    assert_eq!(outcome.booking.aggregates.gross_total(), 20000);
    assert_aggregates_match_ledger(&env, id).await;
}

#[tokio::test]
async fn test_partner_shares_use_same_residual() {
    let env = setup().await;
    let venue_id = venue(&env, "60").await;
    let mut booking = prime(venue_id, env.concierge_id, 20000, OUTSIDE_PROMO);
    booking.partner_venue_id = Some(env.partner_id);
    booking.partner_concierge_id = Some(env.partner_id);
    let id = env.repo.insert_booking(&booking).await.unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();
    let calc = &outcome.calculation;

    assert_eq!(calc.amount_of(EarningType::PartnerVenue), 360);
    assert_eq!(calc.amount_of(EarningType::PartnerConcierge), 360);
    assert!(calc
        .entries
        .iter()
        .filter(|e| matches!(
            e.earning_type,
            EarningType::PartnerVenue | EarningType::PartnerConcierge
        ))
        .all(|e| e.user_id == env.partner_user));
    assert_eq!(calc.platform_earnings, 20000 - 12000 - 2000 - 720);
    assert_eq!(outcome.booking.aggregates.gross_total(), 20000);
    assert_aggregates_match_ledger(&env, id).await;
}

#[tokio::test]
async fn test_non_prime_bounty_and_venue_debit() {
    let env = setup().await;
    let venue_id = venue(&env, "60").await;
    let mut booking = prime(venue_id, env.concierge_id, 0, OUTSIDE_PROMO);
    booking.is_prime = false;
    booking.guest_count = 3;
    let id = env.repo.insert_booking(&booking).await.unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();
    let calc = &outcome.calculation;

    assert_eq!(calc.amount_of(EarningType::ConciergeBounty), 24);
    assert_eq!(calc.platform_earnings, 6 + 3);
    assert_eq!(calc.amount_of(EarningType::VenuePaid), -(24 + 9));
    assert_eq!(calc.amount_of(EarningType::Venue), 0);
    assert_eq!(calc.amount_of(EarningType::Concierge), 0);
    assert_eq!(calc.reconciled_total(), Some(0));
    assert_eq!(outcome.booking.aggregates.venue_earnings, -33);
    assert_aggregates_match_ledger(&env, id).await;
}

#[tokio::test]
async fn test_promotion_doubles_concierge_from_platform_share() {
    let env = setup().await;
    let venue_id = venue(&env, "60").await;
    let id = env
        .repo
        .insert_booking(&prime(
            venue_id,
            env.concierge_id,
            20000,
            PROMO_START + 86_400_000,
        ))
        .await
        .unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();
    assert_eq!(outcome.calculation.amount_of(EarningType::Concierge), 4000);
    assert_eq!(outcome.calculation.amount_of(EarningType::Venue), 12000);
    assert_eq!(outcome.calculation.platform_earnings, 4000);
}

#[tokio::test]
async fn test_promotion_window_boundaries() {
    let env = setup().await;
    let venue_id = venue(&env, "60").await;

    let cases = [
        (PROMO_START, 4000),
        (PROMO_END, 4000),
        (PROMO_START - 1_000, 2000),
        (PROMO_END + 1_000, 2000),
    ];
    for (booking_at, expected) in cases {
        let id = env
            .repo
            .insert_booking(&prime(venue_id, env.concierge_id, 20000, booking_at))
            .await
            .unwrap();
        let outcome = env.service.calculate_earnings(id).await.unwrap();
        assert_eq!(
            outcome.calculation.amount_of(EarningType::Concierge),
            expected,
            "booking_at {}",
            booking_at
        );
    }
}

#[tokio::test]
async fn test_promotion_skips_non_prime() {
    let env = setup().await;
    let venue_id = venue(&env, "60").await;
    let mut booking = prime(venue_id, env.concierge_id, 0, PROMO_START + 1_000);
    booking.is_prime = false;
    booking.guest_count = 3;
    let id = env.repo.insert_booking(&booking).await.unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();
    assert_eq!(outcome.calculation.amount_of(EarningType::ConciergeBounty), 24);
}

#[tokio::test]
async fn test_full_allocation_leaves_platform_empty() {
    let env = setup().await;
    let venue_id = venue(&env, "90").await;
    let mut booking = prime(venue_id, env.concierge_id, 20000, OUTSIDE_PROMO);
    booking.partner_venue_id = Some(env.partner_id);
    let id = env.repo.insert_booking(&booking).await.unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();
    assert_eq!(outcome.calculation.amount_of(EarningType::PartnerVenue), 0);
    assert_eq!(outcome.calculation.platform_earnings, 0);
    assert_eq!(outcome.calculation.reconciled_total(), Some(20000));
    assert_aggregates_match_ledger(&env, id).await;
}

#[tokio::test]
async fn test_over_allocation_makes_platform_negative() {
    let env = setup().await;
    let venue_id = venue(&env, "90").await;
    let id = env
        .repo
        .insert_booking(&prime(
            venue_id,
            env.concierge_id,
            20000,
            PROMO_START + 1_000,
        ))
        .await
        .unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();
    assert_eq!(outcome.calculation.amount_of(EarningType::Venue), 18000);
    assert_eq!(outcome.calculation.amount_of(EarningType::Concierge), 4000);
    assert_eq!(outcome.calculation.platform_earnings, -2000);
    assert_eq!(outcome.booking.aggregates.platform_earnings, -2000);
    assert_eq!(outcome.booking.aggregates.gross_total(), 20000);
}

#[tokio::test]
async fn test_omakase_concierge_fee_per_guest() {
    let env = setup().await;
    let venue_id = env
        .repo
        .insert_venue(
            env.venue_user,
            &NewVenue {
                name: "Omakase".to_string(),
                payout_venue: Some(pct("60")),
                is_omakase: true,
                omakase_concierge_fee: Some(1500),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let id = env
        .repo
        .insert_booking(&prime(venue_id, env.concierge_id, 20000, OUTSIDE_PROMO))
        .await
        .unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();
    assert_eq!(outcome.calculation.amount_of(EarningType::Concierge), 3000);
    assert_eq!(outcome.calculation.platform_earnings, 5000);
}

#[tokio::test]
async fn test_zero_fee_prime_writes_empty_ledger() {
    let env = setup().await;
    let venue_id = venue(&env, "60").await;
    let id = env
        .repo
        .insert_booking(&prime(venue_id, env.concierge_id, 0, OUTSIDE_PROMO))
        .await
        .unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();
    assert!(outcome.calculation.entries.is_empty());
    assert!(env.repo.earnings_for_booking(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_booking_earns_nothing() {
    let env = setup().await;
    let venue_id = venue(&env, "60").await;
    let mut booking = prime(venue_id, env.concierge_id, 20000, OUTSIDE_PROMO);
    booking.status = BookingStatus::Pending;
    let id = env.repo.insert_booking(&booking).await.unwrap();

    let outcome = env.service.calculate_earnings(id).await.unwrap();
    assert!(outcome.calculation.entries.is_empty());
    assert_eq!(outcome.booking.aggregates.gross_total(), 0);
}
