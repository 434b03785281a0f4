//! Headless host for mesh export resolution.
//!
//! Resolves the 3D Tiles export of a model, loads its root tileset, and
//! prints the tileset URL together with the transform that places the mesh
//! at the origin of a y-up scene. A renderer consumes this output instead of
//! talking to the export service itself.

mod launch_params;
mod poll;

use std::process::ExitCode;

use mesh_export::RootAlignment;
use mesh_export::align::ecef_to_lat_lon;

use launch_params::LaunchParams;

async fn run(params: &LaunchParams) -> Result<(), Box<dyn std::error::Error>> {
    let session = params.session()?;
    let client = params.client();

    let locator = {
        let client = &client;
        let session = &session;
        let model_id = params.model_id.as_str();
        poll::wait_for_tileset(params.poll_policy(), move || {
            client.resolve_tileset(session, model_id)
        })
        .await?
    };

    let tileset = client.fetch_root_tileset(&locator).await?;
    let sphere = tileset.root_bounding_sphere()?;

    let mut alignment = RootAlignment::new();
    let Some(result) = alignment.on_root_loaded(&sphere)? else {
        return Ok(());
    };

    let (lat, lon) = ecef_to_lat_lon(sphere.center);
    tracing::info!(
        lat,
        lon,
        radius = sphere.radius,
        vertical_offset = result.vertical_offset,
        "model placed at origin"
    );

    let rotation = result.rotation;
    let summary = serde_json::json!({
        "tilesetUrl": locator.as_str(),
        "signature": locator.signature(),
        "boundingSphere": {
            "center": sphere.center.to_array(),
            "radius": sphere.radius,
        },
        "rotation": [rotation.x, rotation.y, rotation.z, rotation.w],
        "verticalOffset": result.vertical_offset,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let params = launch_params::parse();

    match run(&params).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(model_id = %params.model_id, "{e}");
            ExitCode::FAILURE
        }
    }
}
