use std::fmt::Write;

use crate::commands::send_chunked;
use crate::nearby::export::{map_points, to_csv};
use crate::nearby::{Category, NearbyHit};
use crate::state::{Context, MAX_RESULTS_CAP};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Find police stations, lawyers, NGOs and hospitals near a place
#[poise::command(slash_command, guild_only)]
pub async fn nearby(
    ctx: Context<'_>,
    #[description = "Pincode or city (defaults to your saved location)"] location: Option<String>,
    #[description = "Results per category (1-10)"]
    #[min = 1]
    #[max = 10]
    limit: Option<u32>,
) -> Result<(), anyhow::Error> {
    let settings = ctx.data().settings_for(ctx.author().id.get()).await;
    let location = location
        .or(settings.location)
        .filter(|l| !l.trim().is_empty());

    let Some(location) = location else {
        ctx.say(
            "Enter a pincode or city, e.g. `/nyay nearby location:560001 Bengaluru`, \
             or save one with `/nyay settings`.",
        )
        .await?;
        return Ok(());
    };

    ctx.defer().await?;

    let limit = limit
        .map(|l| l as usize)
        .unwrap_or(settings.max_results)
        .clamp(1, MAX_RESULTS_CAP);

    info!(user = %ctx.author().name, location, limit, "nearby search started");

    let Some(point) = ctx.data().geocoder.resolve(&location).await else {
        ctx.say("Could not geocode that location. Try '560001 Bengaluru' or a city name.")
            .await?;
        return Ok(());
    };

    info!(display_name = %point.display_name, "location resolved");
    ctx.say(format!(
        "Found location: {} ({:.5}, {:.5})",
        point.address, point.latitude, point.longitude
    ))
    .await?;

    for category in Category::ALL {
        let hits = ctx
            .data()
            .places
            .search(category.query(), &point, limit)
            .await;

        send_chunked(&ctx, &format_category(category, &hits)).await?;
        if hits.is_empty() {
            continue;
        }

        ctx.send(
            poise::CreateReply::default()
                .content(format!("Download {} (CSV)", category.title()))
                .attachment(serenity::CreateAttachment::bytes(
                    to_csv(&hits).into_bytes(),
                    format!("{}.csv", category.file_stem()),
                )),
        )
        .await?;
    }

    Ok(())
}

fn format_category(category: Category, hits: &[NearbyHit]) -> String {
    let mut out = format!("### {}\n", category.title());
    if hits.is_empty() {
        out.push_str("No results found (try a nearby city or use Google Places API).\n");
        return out;
    }
    for (i, (hit, point)) in hits.iter().zip(map_points(hits)).enumerate() {
        let _ = writeln!(
            out,
            "**{}.** {}\n{}\nDistance: {} km ([map](<{}>))",
            i + 1,
            hit.name,
            hit.address,
            hit.distance_km,
            point.osm_url()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_empty_category() {
        let text = format_category(Category::Ngos, &[]);
        assert_eq!(
            text,
            "### NGOs / Helplines\nNo results found (try a nearby city or use Google Places API).\n"
        );
    }

    #[test]
    fn test_format_hits() {
        let hits = vec![NearbyHit {
            name: "Ulsoor Police Station".into(),
            address: "Ulsoor Police Station, Bengaluru".into(),
            latitude: 12.98,
            longitude: 77.62,
            distance_km: 2.75,
        }];
        let text = format_category(Category::PoliceStations, &hits);
        assert!(text.starts_with("### Police Stations\n**1.** Ulsoor Police Station\n"));
        assert!(text.contains("Distance: 2.75 km"));
        assert!(text.contains("mlat=12.98&mlon=77.62"));
    }
}
