//! Whole-machine tests: CPU, PLA, memory map and the built-in Kernal.

use c64_emu::{Error, EventScheduler, MachineConfig, RomSet, C64};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn machine() -> C64 {
    init_logging();
    C64::new(MachineConfig::default(), None).unwrap()
}

#[test]
fn test_program_fills_screen_memory() {
    let mut c64 = machine();
    c64.reset_to(0xC000);
    // LDX #$00 ; loop: TXA ; STA $0400,X ; INX ; BNE loop ; JAM
    c64.load(
        0xC000,
        &[0xA2, 0x00, 0x8A, 0x9D, 0x00, 0x04, 0xE8, 0xD0, 0xF9, 0x02],
    );
    c64.run_cycles(10_000);

    assert!(c64.cpu().borrow().is_jammed());
    for i in 0..=0xFFu16 {
        assert_eq!(c64.peek_ram(0x0400 + i), i as u8);
    }
}

#[test]
fn test_stub_kernal_idles_with_interrupts_enabled() {
    let c64 = machine();
    c64.run_cycles(200);
    let state = c64.cpu().borrow().state();
    assert!((0xFCFA..=0xFCFD).contains(&state.pc), "pc=${:04X}", state.pc);
    assert_eq!(state.sp, 0xFF);
    assert!(!state.p.is_set(c64_emu::mos6510::status::I));
    // RAM vectors set up by the reset routine
    assert_eq!(c64.peek_ram(0x0314), 0x31);
    assert_eq!(c64.peek_ram(0x0315), 0xEA);
}

#[test]
fn test_stub_irq_handler_returns_to_idle_loop() {
    let c64 = machine();
    c64.run_cycles(200);

    c64.cpu().borrow_mut().trigger_irq();
    c64.run_cycles(20);
    c64.cpu().borrow_mut().clear_irq();
    c64.run_cycles(300);

    let state = c64.cpu().borrow().state();
    assert!((0xFCFA..=0xFCFD).contains(&state.pc), "pc=${:04X}", state.pc);
    assert_eq!(state.sp, 0xFF);
    // the interrupted address was pushed
    assert_eq!(c64.peek_ram(0x01FF), 0xFC);
}

#[test]
fn test_stub_nmi_handler_returns_to_idle_loop() {
    let c64 = machine();
    c64.run_cycles(200);
    c64.cpu().borrow_mut().trigger_nmi();
    c64.run_cycles(100);

    let state = c64.cpu().borrow().state();
    assert!((0xFCFA..=0xFCFD).contains(&state.pc), "pc=${:04X}", state.pc);
    assert_eq!(state.sp, 0xFF);
    assert!(!state.p.is_set(c64_emu::mos6510::status::I));
}

#[test]
fn test_program_banks_out_kernal() {
    let mut c64 = machine();
    c64.reset_to(0xC000);
    // LDA #$2F ; STA $00 ; LDA #$35 ; STA $01 ; LDA $E000 ; STA $02 ; JAM
    c64.load(
        0xC000,
        &[
            0xA9, 0x2F, 0x85, 0x00, 0xA9, 0x35, 0x85, 0x01, 0xAD, 0x00, 0xE0, 0x85, 0x02,
            0x02,
        ],
    );
    c64.load(0xE000, &[0x77]);
    c64.run_cycles(100);

    assert!(c64.cpu().borrow().is_jammed());
    assert_eq!(c64.peek_ram(0x0002), 0x77);
}

#[test]
fn test_reset_restores_vector_and_ram() {
    let mut c64 = machine();
    c64.reset_to(0xC000);
    c64.load(0xC000, &[0x02]);
    c64.run_cycles(20);
    assert!(c64.cpu().borrow().is_jammed());

    c64.reset();
    c64.run_cycles(200);
    assert!(!c64.cpu().borrow().is_jammed());
    assert!((0xFCFA..=0xFCFD).contains(&c64.cpu().borrow().pc()));
    // power-on pattern again
    assert_eq!(c64.peek_ram(0xC000), 0xFF);
    assert_eq!(c64.peek_ram(0xC002), 0x00);
}

#[test]
fn test_bad_rom_image_is_rejected_before_running() {
    init_logging();
    let roms = RomSet {
        kernal: vec![0; 100],
        basic: vec![0; 0x2000],
        chargen: vec![0; 0x1000],
    };
    let err = C64::new(MachineConfig::default(), Some(roms)).err().unwrap();
    assert!(matches!(
        err,
        Error::RomSize { name: "kernal", expected: 0x2000, actual: 100 }
    ));
}

#[test]
fn test_missing_rom_dir_is_reported() {
    init_logging();
    let config = MachineConfig {
        rom_dir: Some("/nonexistent/c64-roms".into()),
        ..MachineConfig::default()
    };
    let err = C64::new(config, None).err().unwrap();
    assert!(matches!(err, Error::RomNotFound { .. }));
}

#[test]
fn test_thread_safe_action_runs_on_emulation_thread() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let c64 = machine();
    let sender = c64.scheduler().thread_safe_sender();
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    std::thread::spawn(move || {
        sender
            .send(Box::new(move |_: &EventScheduler| {
                flag.store(true, Ordering::SeqCst)
            }))
            .unwrap();
    })
    .join()
    .unwrap();

    c64.run_cycles(60_000);
    assert!(ran.load(Ordering::SeqCst));
}
