use std::{net::TcpListener, sync::Arc};

use actix_web::{
    HttpServer,
    dev::Server,
    web::{self, Data},
};
use hfp_consumer::{Ingestor, MqttFeed, SubscriptionManager};
use hfp_core::{FeedClient, SpatialQueryEngine};
use postgres::PostgresAdapter;
use snafu::ResultExt;
use tracing::info;
use tracing_actix_web::TracingLogger;

use crate::{
    Database,
    error::{
        StartupError,
        startup_error::{DatabaseSnafu, ListenerSnafu},
    },
    routes,
    settings::Settings,
};

pub struct App {
    server: Server,
    port: u16,
}

impl App {
    pub async fn build(settings: &Settings) -> Result<App, StartupError> {
        let listener =
            TcpListener::bind(settings.api.listener_address()).context(ListenerSnafu)?;

        let postgres = PostgresAdapter::new(&settings.postgres)
            .await
            .context(DatabaseSnafu)?;

        if settings.environment.runs_migrations() {
            postgres.do_migrations().await.context(DatabaseSnafu)?;
        }

        let feed = MqttFeed::connect(&settings.feed);

        App::build_with(postgres, feed, listener, settings)
    }

    /// Builds the server on top of the given store and feed, the listener decides the port.
    pub fn build_with<T, F>(
        database: T,
        feed: F,
        listener: TcpListener,
        settings: &Settings,
    ) -> Result<App, StartupError>
    where
        T: Database,
        F: FeedClient + 'static,
    {
        let port = listener.local_addr().context(ListenerSnafu)?.port();
        let server = create_server(database, feed, listener, settings).context(ListenerSnafu)?;

        info!("listening on port {port}");

        Ok(App { server, port })
    }

    pub async fn run(self) -> Result<(), std::io::Error> {
        self.server.await
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

fn create_server<T, F>(
    database: T,
    feed: F,
    listener: TcpListener,
    settings: &Settings,
) -> Result<Server, std::io::Error>
where
    T: Database,
    F: FeedClient + 'static,
{
    // Shared by every worker so all sessions go through the same subscription counts.
    let subscriptions = Arc::new(SubscriptionManager::new(feed, settings.feed.ack_timeout));
    let ingestor = Data::new(Ingestor::new(
        database.clone(),
        subscriptions,
        settings.feed.topic.clone(),
    ));
    let engine = Data::new(SpatialQueryEngine::new(database));

    let mut server = HttpServer::new(move || {
        actix_web::App::new()
            .app_data(ingestor.clone())
            .app_data(engine.clone())
            .wrap(TracingLogger::default())
            .service(
                web::scope("/api/vehicles")
                    .route("/ingest", web::post().to(routes::ingest::ingest::<T, F>))
                    .route("/closest", web::get().to(routes::vehicles::closest::<T>))
                    .route(
                        "/unique-closest",
                        web::get().to(routes::vehicles::unique_closest::<T>),
                    )
                    .route(
                        "/average-speed",
                        web::get().to(routes::vehicles::average_speed::<T>),
                    )
                    .route(
                        "/metro-max-speeds",
                        web::get().to(routes::vehicles::metro_max_speeds::<T>),
                    ),
            )
    });

    if let Some(workers) = settings.api.num_workers {
        server = server.workers(workers as usize);
    }

    Ok(server.listen(listener)?.run())
}
