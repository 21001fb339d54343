#![cfg(not(target_arch = "wasm32"))]

use ps2kbc_devices_input::{I8042Controller, Ps2DeviceModel};
use proptest::prelude::*;

const DATA: u16 = 0x60;
const CMD: u16 = 0x64;

/// Host-side actions that never hit a fatal controller path.
#[derive(Debug, Clone)]
enum Op {
    KeyboardCommand(u8),
    KeyboardWithParam(u8, u8),
    MouseCommand(u8),
    MouseWithParam(u8, u8),
    MouseUnknown(u8),
    WriteCommandByte(u8),
    GetCommandByte,
    WriteMouseOutputBuff(u8),
    PortEnable(u8),
    InjectKeyboard(Vec<u8>),
    InjectMouse(Vec<u8>),
    ReadData,
    ReadStatus,
}

fn device_op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::sample::select(vec![0xF2u8, 0xF4, 0xF5, 0xF6]).prop_map(Op::KeyboardCommand),
        (prop::sample::select(vec![0xEDu8, 0xF3]), any::<u8>())
            .prop_map(|(cmd, param)| Op::KeyboardWithParam(cmd, param)),
        prop::sample::select(vec![
            0xE6u8, 0xE7, 0xE9, 0xF2, 0xF4, 0xF5, 0xF6, 0xFF
        ])
        .prop_map(Op::MouseCommand),
        (prop::sample::select(vec![0xE8u8, 0xF3]), any::<u8>())
            .prop_map(|(cmd, param)| Op::MouseWithParam(cmd, param)),
        (0u8..0xE6).prop_map(Op::MouseUnknown),
    ]
}

fn host_op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::WriteCommandByte),
        Just(Op::GetCommandByte),
        any::<u8>().prop_map(Op::WriteMouseOutputBuff),
        prop::sample::select(vec![0xA7u8, 0xA8, 0xAD, 0xAE]).prop_map(Op::PortEnable),
        prop::collection::vec(any::<u8>(), 0..6).prop_map(Op::InjectKeyboard),
        prop::collection::vec(any::<u8>(), 0..6).prop_map(Op::InjectMouse),
        Just(Op::ReadData),
        Just(Op::ReadStatus),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![device_op_strategy(), host_op_strategy()]
}

fn to_mouse(c: &mut I8042Controller, byte: u8) {
    c.write_port(CMD, 0xD4).unwrap();
    c.write_port(DATA, byte).unwrap();
}

/// Applies `op` and returns whatever the host observed on the ports.
fn apply(c: &mut I8042Controller, op: &Op) -> Option<u8> {
    match *op {
        Op::KeyboardCommand(cmd) => {
            c.write_port(DATA, cmd).unwrap();
            None
        }
        Op::KeyboardWithParam(cmd, param) => {
            c.write_port(DATA, cmd).unwrap();
            c.write_port(DATA, param).unwrap();
            None
        }
        Op::MouseCommand(cmd) | Op::MouseUnknown(cmd) => {
            to_mouse(c, cmd);
            None
        }
        Op::MouseWithParam(cmd, param) => {
            to_mouse(c, cmd);
            to_mouse(c, param);
            None
        }
        Op::WriteCommandByte(value) => {
            c.write_port(CMD, 0x60).unwrap();
            c.write_port(DATA, value).unwrap();
            None
        }
        Op::GetCommandByte => {
            c.write_port(CMD, 0x20).unwrap();
            None
        }
        Op::WriteMouseOutputBuff(value) => {
            c.write_port(CMD, 0xD3).unwrap();
            c.write_port(DATA, value).unwrap();
            None
        }
        Op::PortEnable(cmd) => {
            c.write_port(CMD, cmd).unwrap();
            None
        }
        Op::InjectKeyboard(ref bytes) => {
            c.inject_keyboard_bytes(bytes);
            None
        }
        Op::InjectMouse(ref bytes) => {
            c.inject_mouse_bytes(bytes);
            None
        }
        Op::ReadData => Some(c.read_port(DATA).unwrap().0),
        Op::ReadStatus => Some(c.read_port(CMD).unwrap().0),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn output_buffer_flags_track_device_queues(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut c = I8042Controller::new();
        for op in &ops {
            let keyboard_queued = c.keyboard().has_data();
            apply(&mut c, op);
            let status = c.status();

            // Nothing stays queued behind an empty data register.
            if !status.output_full {
                prop_assert!(!c.keyboard().has_data());
                prop_assert!(!c.mouse().has_data());
            }
            if status.mouse_output_full {
                prop_assert!(status.output_full);
            }
            // A refill after a data read always favors the keyboard.
            if matches!(op, Op::ReadData) && keyboard_queued {
                prop_assert!(status.output_full);
                prop_assert!(!status.mouse_output_full);
            }
        }
    }

    #[test]
    fn identical_histories_observe_identical_bytes(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut a = I8042Controller::new();
        let mut b = I8042Controller::new();

        let seen_a: Vec<Option<u8>> = ops.iter().map(|op| apply(&mut a, op)).collect();
        let seen_b: Vec<Option<u8>> = ops.iter().map(|op| apply(&mut b, op)).collect();

        prop_assert_eq!(seen_a, seen_b);
        prop_assert_eq!(a.status(), b.status());
        prop_assert_eq!(a.command_byte(), b.command_byte());
        prop_assert_eq!(a.data_register(), b.data_register());
    }

    #[test]
    fn mouse_unknown_commands_never_disturb_its_settings(
        setup in prop::collection::vec(op_strategy(), 0..32),
        unknown in 0u8..0xE6,
    ) {
        let mut c = I8042Controller::new();
        for op in &setup {
            apply(&mut c, op);
        }
        while c.status().output_full {
            c.read_port(DATA).unwrap();
        }
        let before = (c.mouse().status(), c.mouse().resolution(), c.mouse().sample_rate());

        to_mouse(&mut c, unknown);

        prop_assert_eq!(
            (c.mouse().status(), c.mouse().resolution(), c.mouse().sample_rate()),
            before
        );
        prop_assert_eq!(c.data_register(), 0xFE);
        prop_assert!(c.status().mouse_output_full);
    }
}
