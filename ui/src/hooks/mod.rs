pub mod use_scan_controller;
