use cooldown::{
    BucketScope, Cooldown, CooldownError, CooldownLayer, CooldownPolicy, Identity, ManualClock,
};
use std::convert::Infallible;
use std::time::Duration;
use tower::{service_fn, Layer, ServiceBuilder, ServiceExt};

#[derive(Debug, Clone)]
struct Invocation {
    command: &'static str,
    user: u64,
    channel: u64,
    guild: Option<u64>,
}

fn identity(inv: &Invocation) -> Identity {
    match inv.guild {
        Some(guild) => Identity::in_guild(inv.user, inv.channel, guild),
        None => Identity::direct(inv.user, inv.channel),
    }
}

#[tokio::test]
async fn per_guild_cooldown_falls_back_to_channel_in_dms() {
    let clock = ManualClock::new();
    let cooldown = Cooldown::with_clock(
        CooldownPolicy::new(1, Duration::from_secs(60), BucketScope::GUILD).unwrap(),
        clock.clone(),
    );
    let svc = ServiceBuilder::new()
        .layer(CooldownLayer::new(cooldown, identity))
        .service(service_fn(|inv: Invocation| async move { Ok::<_, Infallible>(inv.command) }));

    let in_guild = Invocation { command: "ping", user: 1, channel: 10, guild: Some(500) };
    assert_eq!(svc.clone().oneshot(in_guild.clone()).await.unwrap(), "ping");

    // another channel in the same guild shares the guild bucket
    let same_guild = Invocation { channel: 11, user: 2, ..in_guild.clone() };
    let err = svc.clone().oneshot(same_guild).await.unwrap_err();
    assert!(matches!(err, CooldownError::CoolingDown { wait } if wait == Duration::from_secs(60)));

    // DMs are keyed per channel
    let dm_a = Invocation { command: "ping", user: 1, channel: 900, guild: None };
    let dm_b = Invocation { command: "ping", user: 2, channel: 901, guild: None };
    assert!(svc.clone().oneshot(dm_a.clone()).await.is_ok());
    assert!(svc.clone().oneshot(dm_b).await.is_ok());
    assert!(svc.clone().oneshot(dm_a.clone()).await.unwrap_err().is_cooling_down());

    clock.advance(Duration::from_secs(60));
    assert!(svc.clone().oneshot(dm_a).await.is_ok());
    assert!(svc.oneshot(in_guild).await.is_ok());
}

#[tokio::test]
async fn rejection_reports_remaining_wait() {
    let clock = ManualClock::new();
    let cooldown = Cooldown::with_clock(
        CooldownPolicy::from_secs(2, 2.5, BucketScope::USER).unwrap(),
        clock.clone(),
    );
    let svc = CooldownLayer::new(cooldown.clone(), identity)
        .layer(service_fn(|_inv: Invocation| async { Ok::<_, Infallible>(()) }));
    let inv = Invocation { command: "roll", user: 4, channel: 1, guild: Some(2) };

    assert!(svc.clone().oneshot(inv.clone()).await.is_ok());
    assert!(svc.clone().oneshot(inv.clone()).await.is_ok());
    clock.advance(Duration::from_millis(1_000));
    let err = svc.clone().oneshot(inv.clone()).await.unwrap_err();
    assert_eq!(err.wait(), Some(Duration::from_millis(1_500)));
    assert_eq!(cooldown.remaining_cooldown(&identity(&inv)), Duration::from_millis(1_500));
}
