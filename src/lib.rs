pub mod commands;
pub mod connection;
pub mod events;
pub mod serial;

use std::sync::Arc;

use connection::ConnectionManager;
use serial::SystemTransport;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  // Create the shared connection manager over the real serial layer
  let manager = Arc::new(ConnectionManager::new(Arc::new(SystemTransport)));

  tauri::Builder::default()
    .manage(manager)
    .invoke_handler(tauri::generate_handler![
      commands::list_ports,
      commands::open_port,
      commands::close_port,
    ])
    .setup(|app| {
      if cfg!(debug_assertions) {
        app.handle().plugin(
          tauri_plugin_log::Builder::default()
            .level(log::LevelFilter::Info)
            .build(),
        )?;
      }

      // Bridge connection events onto window events
      let manager: tauri::State<Arc<ConnectionManager>> = app.state();
      events::spawn_event_forwarder(app.handle().clone(), manager.inner().clone());

      log::info!("SerialScope application started");
      Ok(())
    })
    .on_window_event(|window, event| {
      // Release the serial device before the window goes down.
      if let tauri::WindowEvent::CloseRequested { .. } = event {
        let manager = window
          .app_handle()
          .state::<Arc<ConnectionManager>>()
          .inner()
          .clone();
        tauri::async_runtime::block_on(async move {
          let _ = manager.close().await;
        });
      }
    })
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
