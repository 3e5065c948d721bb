#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use reversi_arena::Board;
use reversi_arena::wasm;

fn field(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn ready_flag() {
    assert!(reversi_arena::wasm_ready());
}

#[wasm_bindgen_test]
fn opening_has_four_moves_for_black() {
    let cells = Board::new().to_array();

    let moves = Array::from(&wasm::legal_moves(&cells, 1).unwrap());

    assert_eq!(moves.length(), 4);
    assert_eq!(field(&moves.get(0), "row").as_f64(), Some(2.0));
    assert_eq!(field(&moves.get(0), "col").as_f64(), Some(4.0));
}

#[wasm_bindgen_test]
fn place_stone_reports_captures() {
    let cells = Board::new().to_array();

    let placed = wasm::place_stone(&cells, 2, 4, 1).unwrap();

    let captured = Array::from(&field(&placed, "captured"));
    assert_eq!(captured.length(), 1);
    assert_eq!(Array::from(&field(&placed, "cells")).length(), 64);
}

#[wasm_bindgen_test]
fn illegal_placement_and_bad_side_are_errors() {
    let cells = Board::new().to_array();

    assert!(wasm::place_stone(&cells, 0, 0, 1).is_err());
    assert!(wasm::legal_moves(&cells, 3).is_err());
}

#[wasm_bindgen_test]
fn opening_snapshot_is_in_progress() {
    let cells = Board::new().to_array();

    let snap = wasm::snapshot(&cells, -1).unwrap();

    assert_eq!(field(&snap, "black_count").as_f64(), Some(2.0));
    assert_eq!(field(&snap, "outcome").as_string().as_deref(), Some("InProgress"));
    assert_eq!(
        wasm::outcome(&cells).unwrap().as_string().as_deref(),
        Some("InProgress")
    );
}
