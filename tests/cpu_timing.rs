//! Cycle counts and bus traffic of individual instructions.

mod common;

use common::{Access, Rig};

/// Cycles per opcode with zeroed operands and registers: no page
/// crossings, and branches whose condition holds after RST (C, Z, N
/// and V clear) are taken.  0 marks the JAM opcodes.
#[rustfmt::skip]
const CYCLES: [u8; 256] = [
//  x0 x1 x2 x3 x4 x5 x6 x7 x8 x9 xA xB xC xD xE xF
    7, 6, 0, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6, // 0x
    3, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 1x
    6, 6, 0, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6, // 2x
    2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 3x
    6, 6, 0, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6, // 4x
    3, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 5x
    6, 6, 0, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6, // 6x
    2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 7x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // 8x
    3, 6, 0, 6, 4, 4, 4, 4, 2, 5, 2, 5, 5, 5, 5, 5, // 9x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // Ax
    2, 5, 0, 5, 4, 4, 4, 4, 2, 4, 2, 4, 4, 4, 4, 4, // Bx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Cx
    3, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Dx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Ex
    2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Fx
];

fn first_instruction_cycles(program: &[u8]) -> i64 {
    let rig = Rig::new(0x1000, program);
    rig.run(20);
    let fetches = rig.fetches();
    assert_eq!(fetches[0], (6, 0x1000), "RST must fetch the first opcode at cycle 6");
    fetches[1].0 - fetches[0].0
}

#[test]
fn test_every_opcode_takes_its_documented_cycles() {
    let mut wrong = Vec::new();
    for opcode in 0..=0xFFu8 {
        let expected = CYCLES[opcode as usize];
        if expected == 0 {
            continue;
        }
        let actual = first_instruction_cycles(&[opcode, 0x00, 0x00]);
        if actual != i64::from(expected) {
            wrong.push(format!("${opcode:02X}: {actual} cycles, expected {expected}"));
        }
    }
    assert!(wrong.is_empty(), "{}", wrong.join("\n"));
}

#[test]
fn test_indexed_read_across_page_reads_wrong_address_first() {
    // LDX #$01 ; LDA $12FF,X
    let rig = Rig::new(0x1000, &[0xA2, 0x01, 0xBD, 0xFF, 0x12]);
    rig.poke(0x1300, &[0x5A]);
    rig.run(20);

    let fetches = rig.fetches();
    assert_eq!(fetches[1], (8, 0x1002));
    assert_eq!(fetches[2].0 - fetches[1].0, 5);

    let accesses = rig.accesses();
    assert!(accesses.contains(&(11, Access::Read(0x1200))));
    assert!(accesses.contains(&(12, Access::Read(0x1300))));
    assert_eq!(rig.state().a, 0x5A);
}

#[test]
fn test_indexed_read_within_page_skips_dummy_read() {
    // LDX #$01 ; LDA $1280,X
    let rig = Rig::new(0x1000, &[0xA2, 0x01, 0xBD, 0x80, 0x12]);
    rig.run(20);
    let fetches = rig.fetches();
    assert_eq!(fetches[2].0 - fetches[1].0, 4);
    let reads = rig
        .accesses()
        .iter()
        .filter(|(_, a)| *a == Access::Read(0x1281))
        .count();
    assert_eq!(reads, 1);
}

#[test]
fn test_indexed_store_always_takes_dummy_read() {
    // LDX #$01 ; STA $1280,X
    let rig = Rig::new(0x1000, &[0xA2, 0x01, 0x9D, 0x80, 0x12]);
    rig.run(20);
    let fetches = rig.fetches();
    assert_eq!(fetches[2].0 - fetches[1].0, 5);
    let accesses = rig.accesses();
    assert!(accesses.contains(&(11, Access::Read(0x1281))));
    assert!(accesses.contains(&(12, Access::Write(0x1281, 0x00))));
}

#[test]
fn test_branch_across_page_takes_four_cycles() {
    // $10FC: BNE +2 -> $1100
    let rig = Rig::new(0x10FC, &[0xD0, 0x02, 0xEA, 0xEA, 0xEA]);
    rig.run(20);
    let fetches = rig.fetches();
    assert_eq!(fetches[0], (6, 0x10FC));
    assert_eq!(fetches[1], (10, 0x1100));
    // dummy read at the target with the old high byte
    assert!(rig.accesses().contains(&(9, Access::Read(0x1000))));
}

#[test]
fn test_backward_branch_loop() {
    // LDX #$03 ; loop: DEX ; BNE loop ; JAM
    let rig = Rig::new(0x1000, &[0xA2, 0x03, 0xCA, 0xD0, 0xFD, 0x02]);
    rig.run(50);
    let fetches = rig.fetches();
    let pcs: Vec<u16> = fetches.iter().map(|&(_, pc)| pc).collect();
    assert_eq!(
        pcs,
        [0x1000, 0x1002, 0x1003, 0x1002, 0x1003, 0x1002, 0x1003, 0x1005]
    );
    // taken: 3 cycles, not taken: 2 cycles
    assert_eq!(fetches[3].0 - fetches[2].0, 3);
    assert_eq!(fetches[7].0 - fetches[6].0, 2);
}

#[test]
fn test_rst_sequence_bus_traffic() {
    let rig = Rig::new(0x1234, &[0xEA]);
    rig.run(7);
    let accesses = rig.accesses();
    assert_eq!(
        &accesses[..7],
        &[
            (0, Access::Read(0x0000)),
            (1, Access::Write(0x01FF, 0x00)),
            (2, Access::Write(0x01FE, 0x01)),
            (3, Access::Write(0x01FD, 0x30)),
            (4, Access::Read(0xFFFC)),
            (5, Access::Read(0xFFFD)),
            (6, Access::Read(0x1234)),
        ]
    );
    let state = rig.state();
    assert_eq!(state.sp, 0xFC);
    assert!(state.p.is_set(c64_emu::mos6510::status::I));
}

#[test]
fn test_read_modify_write_writes_twice() {
    // INC $10
    let rig = Rig::new(0x1000, &[0xE6, 0x10]);
    rig.poke(0x0010, &[0x41]);
    rig.run(12);
    let accesses = rig.accesses();
    assert!(accesses.contains(&(8, Access::Read(0x0010))));
    assert!(accesses.contains(&(9, Access::Write(0x0010, 0x41))));
    assert!(accesses.contains(&(10, Access::Write(0x0010, 0x42))));
    assert_eq!(rig.peek(0x0010), 0x42);
}

#[test]
fn test_jmp_indirect_wraps_within_page() {
    // JMP ($10FF): high byte comes from $1000, not $1100
    let rig = Rig::new(0x1000, &[0x6C, 0xFF, 0x10]);
    rig.poke(0x10FF, &[0x34]);
    rig.poke(0x1100, &[0x56]);
    rig.run(20);
    // $1000 holds the JMP opcode itself
    assert_eq!(rig.fetches()[1], (11, 0x6C34));
}

#[test]
fn test_jsr_rts_round_trip() {
    // JSR $1010 ; NOP ; JAM ... $1010: RTS
    let rig = Rig::new(0x1000, &[0x20, 0x10, 0x10, 0xEA, 0x02]);
    rig.poke(0x1010, &[0x60]);
    rig.run(30);
    let fetches = rig.fetches();
    assert_eq!(fetches[1], (12, 0x1010));
    assert_eq!(fetches[2], (18, 0x1003));
    // return address minus one on the stack
    assert_eq!(rig.peek(0x01FC), 0x10);
    assert_eq!(rig.peek(0x01FB), 0x02);
}

#[test]
fn test_forced_jump_continues_at_address() {
    let rig = Rig::new(0x1000, &[0xEA; 16]);
    rig.run(10);
    rig.cpu.borrow_mut().forced_jump(0x4000);
    rig.poke(0x4000, &[0xE8, 0xE8, 0x02]); // INX ; INX ; JAM
    rig.run(10);
    let state = rig.state();
    assert_eq!(state.x, 2);
    assert!(rig.fetches().iter().any(|&(_, pc)| pc == 0x4000));
}

#[test]
fn test_increment_loop_cycle_total() {
    // LDA #$05 ; STA $00 ; loop: INC $00 ; BNE loop ; JAM
    let rig = Rig::new(0x1000, &[0xA9, 0x05, 0x85, 0x00, 0xE6, 0x00, 0xD0, 0xFC, 0x02]);

    // INC + taken BNE is 8 cycles; the first INC is fetched at 11
    rig.run_to(11 + 8 * 10);
    assert_eq!(rig.peek(0x0000), 5 + 10);

    rig.run(2100);
    assert_eq!(rig.peek(0x0000), 0x00);
    // 251 increments, 250 taken branches and one that falls through
    let jam_fetch = 6 + 2 + 3 + 251 * 5 + 250 * 3 + 2;
    assert_eq!(rig.fetches().last(), Some(&(jam_fetch, 0x1008)));
    assert!(rig.cpu.borrow().is_jammed());
}
