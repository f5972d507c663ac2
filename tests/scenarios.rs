//! Whole-program scenarios: combinators, unary/binary arithmetic, recursive
//! conditionals, Church/Scott data structures, and the Ackermann function,
//! each asserting the exact printed normal form.

use std::rc::Rc;
use std::sync::Mutex;

use optiscope::term::{apply, binary_call, cell, fix, if_then_else, lam, unary_call, var, Term};
use optiscope::run_to_string;

static LOCK: Mutex<()> = Mutex::new(());

fn check(term: &Rc<Term>, expected: &str) {
    let _guard = LOCK.lock().unwrap_or_else(|p| p.into_inner());
    let (out, _stats) = run_to_string(term).expect("reduction should succeed");
    assert_eq!(out, expected);
}

// The S, K, I combinators.

fn s_combinator() -> Rc<Term> {
    lam(|x| lam(|y| lam(|z| apply(apply(var(x), var(z)), apply(var(y), var(z))))))
}

fn k_combinator() -> Rc<Term> {
    lam(|x| lam(|_y| var(x)))
}

fn i_combinator() -> Rc<Term> {
    lam(|x| var(x))
}

#[test]
fn skk_reduces_to_identity() {
    let term = apply(apply(s_combinator(), k_combinator()), k_combinator());
    check(&term, "(\u{3bb} 0)");
}

#[test]
fn sksk_reduces_to_k() {
    let term =
        apply(apply(apply(s_combinator(), k_combinator()), s_combinator()), k_combinator());
    check(&term, "(\u{3bb} (\u{3bb} 1))");
}

#[test]
fn ski_applied_to_kis_reduces_to_identity() {
    let term = apply(
        apply(apply(s_combinator(), k_combinator()), i_combinator()),
        apply(apply(k_combinator(), i_combinator()), s_combinator()),
    );
    check(&term, "(\u{3bb} 0)");
}

#[test]
fn sii_applied_to_ii_reduces_to_identity() {
    let term = apply(
        apply(apply(s_combinator(), i_combinator()), i_combinator()),
        apply(i_combinator(), i_combinator()),
    );
    check(&term, "(\u{3bb} 0)");
}

// The B, C, W combinators.

fn b_combinator() -> Rc<Term> {
    lam(|f| lam(|g| lam(|x| apply(var(f), apply(var(g), var(x))))))
}

fn c_combinator() -> Rc<Term> {
    lam(|f| lam(|g| lam(|x| apply(apply(var(f), var(x)), var(g)))))
}

fn w_combinator() -> Rc<Term> {
    lam(|f| lam(|x| apply(apply(var(f), var(x)), var(x))))
}

#[test]
fn bcw_combination_reduces_to_a_flip_join() {
    let term = apply(
        apply(b_combinator(), apply(b_combinator(), w_combinator())),
        apply(apply(b_combinator(), b_combinator()), c_combinator()),
    );
    check(&term, "(\u{3bb} (\u{3bb} (\u{3bb} ((2 0) (1 0)))))");
}

// Unary and binary arithmetic.

fn square(x: u64) -> u64 {
    x * x
}
fn cube(x: u64) -> u64 {
    x * x * x
}
fn halve(x: u64) -> u64 {
    x / 2
}
fn add(x: u64, y: u64) -> u64 {
    x + y
}
fn subtract(x: u64, y: u64) -> u64 {
    x - y
}
fn multiply(x: u64, y: u64) -> u64 {
    x * y
}
fn divide(x: u64, y: u64) -> u64 {
    x / y
}
fn equals(x: u64, y: u64) -> u64 {
    (x == y) as u64
}
fn is_zero(x: u64) -> u64 {
    (x == 0) as u64
}
fn is_one(x: u64) -> u64 {
    (x == 1) as u64
}

#[test]
fn unary_arithmetic_pipeline() {
    let term = unary_call(
        halve,
        apply(
            lam(|f| apply(var(f), cell(4))),
            lam(|x| unary_call(cube, unary_call(square, var(x)))),
        ),
    );
    check(&term, "cell[2048]");
}

#[test]
fn binary_arithmetic_pipeline() {
    let term = apply(
        lam(|f| {
            binary_call(
                divide,
                binary_call(subtract, apply(var(f), cell(10)), cell(8)),
                cell(2),
            )
        }),
        lam(|x| binary_call(multiply, binary_call(add, var(x), cell(5)), cell(2))),
    );
    check(&term, "cell[11]");
}

#[test]
fn nested_conditionals() {
    let term = if_then_else(
        apply(
            lam(|x| if_then_else(binary_call(equals, var(x), cell(100)), cell(0), cell(1))),
            cell(100),
        ),
        cell(5),
        cell(10),
    );
    check(&term, "cell[10]");
}

// Recursive Fibonacci via `fix`.

fn fix_fibonacci_term() -> Rc<Term> {
    fix(lam(|rec| {
        lam(|n| {
            if_then_else(
                unary_call(is_zero, var(n)),
                cell(0),
                if_then_else(
                    unary_call(is_one, var(n)),
                    cell(1),
                    binary_call(
                        add,
                        apply(var(rec), binary_call(subtract, var(n), cell(1))),
                        apply(var(rec), binary_call(subtract, var(n), cell(2))),
                    ),
                ),
            )
        })
    }))
}

#[test]
fn fix_fibonacci_of_ten() {
    let term = apply(fix_fibonacci_term(), cell(10));
    check(&term, "cell[55]");
}

// Church booleans.

fn church_true() -> Rc<Term> {
    lam(|x| lam(|_y| var(x)))
}
fn church_false() -> Rc<Term> {
    lam(|_x| lam(|y| var(y)))
}
fn church_not() -> Rc<Term> {
    lam(|p| lam(|a| lam(|b| apply(apply(var(p), var(b)), var(a)))))
}
fn church_and() -> Rc<Term> {
    lam(|p| lam(|q| apply(apply(var(p), var(q)), var(p))))
}
fn church_or() -> Rc<Term> {
    lam(|p| lam(|q| apply(apply(var(p), var(p)), var(q))))
}
fn church_xor() -> Rc<Term> {
    lam(|p| {
        lam(|q| {
            apply(
                apply(var(p), apply(apply(var(q), church_false()), church_true())),
                apply(apply(var(q), church_true()), church_false()),
            )
        })
    })
}
fn church_if_then_else(c: Rc<Term>, t: Rc<Term>, e: Rc<Term>) -> Rc<Term> {
    apply(
        apply(
            apply(lam(|c| lam(|t| lam(|f| apply(apply(var(c), var(t)), var(f))))), c),
            t,
        ),
        e,
    )
}

#[test]
fn boolean_expression() {
    let term = church_if_then_else(
        apply(apply(church_or(), church_true()), church_false()),
        apply(
            apply(
                church_xor(),
                apply(apply(church_and(), church_true()), apply(church_not(), church_false())),
            ),
            church_false(),
        ),
        church_false(),
    );
    check(&term, "(\u{3bb} (\u{3bb} 1))");
}

// Church numerals.

fn church_two() -> Rc<Term> {
    lam(|f| lam(|x| apply(var(f), apply(var(f), var(x)))))
}

#[test]
fn church_two_applied_to_itself() {
    let term = apply(church_two(), church_two());
    check(&term, "(\u{3bb} (\u{3bb} (1 (1 (1 (1 0))))))");
}

// Church lists.

fn church_nil() -> Rc<Term> {
    lam(|_f| lam(|n| var(n)))
}
fn church_cons() -> Rc<Term> {
    lam(|h| lam(|t| lam(|f| lam(|n| apply(apply(var(f), var(h)), apply(apply(var(t), var(f)), var(n)))))))
}
fn church_list_1_2_3() -> Rc<Term> {
    apply(
        apply(church_cons(), cell(1)),
        apply(apply(church_cons(), cell(2)), apply(apply(church_cons(), cell(3)), church_nil())),
    )
}
fn church_sum_list() -> Rc<Term> {
    lam(|list| {
        apply(
            apply(var(list), lam(|x| lam(|y| binary_call(add, var(x), var(y))))),
            cell(0),
        )
    })
}

#[test]
fn church_list_sum() {
    let term = apply(church_sum_list(), church_list_1_2_3());
    check(&term, "cell[6]");
}

// Iterative factorial via a Church-pair/predecessor encoding.

fn church_one() -> Rc<Term> {
    lam(|f| lam(|x| apply(var(f), var(x))))
}
fn church_multiply() -> Rc<Term> {
    lam(|m| lam(|n| lam(|f| lam(|x| apply(apply(var(m), apply(var(n), var(f))), var(x))))))
}
fn church_pair() -> Rc<Term> {
    lam(|x| lam(|y| lam(|z| apply(apply(var(z), var(x)), var(y)))))
}
fn church_first() -> Rc<Term> {
    lam(|p| apply(var(p), church_true()))
}
fn church_second() -> Rc<Term> {
    lam(|p| apply(var(p), church_false()))
}
fn church_predecessor() -> Rc<Term> {
    lam(|n| {
        lam(|f| {
            lam(|x| {
                apply(
                    apply(
                        apply(var(n), lam(|g| lam(|h| apply(var(h), apply(var(g), var(f)))))),
                        lam(|_u| var(x)),
                    ),
                    lam(|v| var(v)),
                )
            })
        })
    })
}
fn factorial_step_term() -> Rc<Term> {
    lam(|p| {
        apply(
            apply(
                church_pair(),
                apply(
                    apply(church_multiply(), apply(church_first(), var(p))),
                    apply(church_second(), var(p)),
                ),
            ),
            apply(church_predecessor(), apply(church_second(), var(p))),
        )
    })
}
fn factorial_term() -> Rc<Term> {
    lam(|n| {
        apply(
            church_first(),
            apply(
                apply(var(n), factorial_step_term()),
                apply(apply(church_pair(), church_one()), var(n)),
            ),
        )
    })
}

#[test]
fn factorial_of_church_three() {
    let three = lam(|f| lam(|x| apply(var(f), apply(var(f), apply(var(f), var(x))))));
    let term = apply(factorial_term(), three);
    check(&term, "(\u{3bb} (\u{3bb} (1 (1 (1 (1 (1 (1 0))))))))");
}

// Scott lists.

fn scott_nil() -> Rc<Term> {
    lam(|n| lam(|_c| var(n)))
}
fn scott_cons() -> Rc<Term> {
    lam(|h| lam(|t| lam(|_n| lam(|c| apply(apply(var(c), var(h)), var(t))))))
}

fn scott_list(values: &[u64]) -> Rc<Term> {
    values
        .iter()
        .rev()
        .fold(scott_nil(), |acc, v| apply(apply(scott_cons(), cell(*v)), acc))
}

fn scott_sum_list() -> Rc<Term> {
    fix(lam(|rec| {
        lam(|list| {
            apply(
                apply(var(list), cell(0)),
                lam(|x| lam(|xs| binary_call(add, var(x), apply(var(rec), var(xs))))),
            )
        })
    }))
}

#[test]
fn scott_list_sum() {
    let term = apply(scott_sum_list(), scott_list(&[1, 2, 3, 4, 5]));
    check(&term, "cell[15]");
}

fn less_than_or_equal(x: u64, y: u64) -> u64 {
    (x <= y) as u64
}

fn scott_insert() -> Rc<Term> {
    fix(lam(|rec| {
        lam(|y| {
            lam(|list| {
                apply(
                    apply(var(list), apply(lam(|x| apply(apply(scott_cons(), var(x)), scott_nil())), var(y))),
                    lam(|z| {
                        lam(|zs| {
                            if_then_else(
                                binary_call(less_than_or_equal, var(y), var(z)),
                                apply(
                                    apply(scott_cons(), var(y)),
                                    apply(apply(scott_cons(), var(z)), var(zs)),
                                ),
                                apply(
                                    apply(scott_cons(), var(z)),
                                    apply(apply(var(rec), var(y)), var(zs)),
                                ),
                            )
                        })
                    }),
                )
            })
        })
    }))
}

fn scott_insertion_sort() -> Rc<Term> {
    fix(lam(|rec| {
        lam(|list| {
            apply(
                apply(var(list), scott_nil()),
                lam(|x| lam(|xs| apply(apply(scott_insert(), var(x)), apply(var(rec), var(xs))))),
            )
        })
    }))
}

fn concatenate_ints(x: u64, y: u64) -> u64 {
    let mut x = x;
    let mut z = y;
    loop {
        x *= 10;
        z /= 10;
        if z == 0 {
            break;
        }
    }
    x + y
}

fn scott_concatenate_list() -> Rc<Term> {
    fix(lam(|rec| {
        lam(|list| {
            apply(
                apply(var(list), cell(0)),
                lam(|x| lam(|xs| binary_call(concatenate_ints, var(x), apply(var(rec), var(xs))))),
            )
        })
    }))
}

#[test]
fn scott_insertion_sort_then_concatenate() {
    let unsorted = scott_list(&[3, 1, 4, 1, 5]);
    let term = apply(scott_concatenate_list(), apply(scott_insertion_sort(), unsorted));
    check(&term, "cell[113450]");
}

fn less_than(x: u64, y: u64) -> u64 {
    (x < y) as u64
}
fn greater_than_or_equal(x: u64, y: u64) -> u64 {
    (x >= y) as u64
}

fn scott_filter() -> Rc<Term> {
    fix(lam(|rec| {
        lam(|f| {
            lam(|list| {
                apply(
                    apply(var(list), scott_nil()),
                    lam(|x| {
                        lam(|xs| {
                            if_then_else(
                                apply(var(f), var(x)),
                                apply(
                                    apply(scott_cons(), var(x)),
                                    apply(apply(var(rec), var(f)), var(xs)),
                                ),
                                apply(apply(var(rec), var(f)), var(xs)),
                            )
                        })
                    }),
                )
            })
        })
    }))
}

fn scott_append() -> Rc<Term> {
    fix(lam(|rec| {
        lam(|xs| {
            lam(|ys| {
                apply(
                    apply(var(xs), var(ys)),
                    lam(|x| lam(|xss| apply(apply(scott_cons(), var(x)), apply(apply(var(rec), var(xss)), var(ys))))),
                )
            })
        })
    }))
}

fn scott_quicksort() -> Rc<Term> {
    fix(lam(|rec| {
        lam(|list| {
            apply(
                apply(var(list), scott_nil()),
                lam(|x| {
                    lam(|xs| {
                        apply(
                            apply(
                                scott_append(),
                                apply(
                                    var(rec),
                                    apply(
                                        apply(scott_filter(), lam(|y| binary_call(less_than, var(y), var(x)))),
                                        var(xs),
                                    ),
                                ),
                            ),
                            apply(
                                apply(scott_cons(), var(x)),
                                apply(
                                    var(rec),
                                    apply(
                                        apply(scott_filter(), lam(|z| binary_call(greater_than_or_equal, var(z), var(x)))),
                                        var(xs),
                                    ),
                                ),
                            ),
                        )
                    })
                }),
            )
        })
    }))
}

#[test]
fn scott_quicksort_then_concatenate() {
    let unsorted = scott_list(&[9, 2, 7, 3, 8, 1, 4]);
    let term = apply(scott_concatenate_list(), apply(scott_quicksort(), unsorted));
    check(&term, "cell[12347890]");
}

// The Ackermann function via `fix`.

fn plus_one(x: u64) -> u64 {
    x + 1
}
fn minus_one(x: u64) -> u64 {
    x - 1
}

fn fix_ackermann() -> Rc<Term> {
    fix(lam(|rec| {
        lam(|m| {
            lam(|n| {
                if_then_else(
                    unary_call(is_zero, var(m)),
                    unary_call(plus_one, var(n)),
                    if_then_else(
                        unary_call(is_zero, var(n)),
                        apply(apply(var(rec), unary_call(minus_one, var(m))), cell(1)),
                        apply(
                            apply(var(rec), unary_call(minus_one, var(m))),
                            apply(apply(var(rec), var(m)), unary_call(minus_one, var(n))),
                        ),
                    ),
                )
            })
        })
    }))
}

#[test]
fn ackermann_of_three_three() {
    let term = apply(apply(fix_ackermann(), cell(3)), cell(3));
    check(&term, "cell[61]");
}

// An optimality counterexample from the literature (Asperti & Guerrini):
// naive graph reduction duplicates work here that optimal sharing does not.

#[test]
fn wadsworth_counterexample_shares_its_only_redex() {
    let once = lam(|v| var(v));
    let term = lam(|y| {
        lam(|z| {
            apply(
                lam(|x| apply(apply(var(x), var(y)), apply(var(x), var(z)))),
                lam(|w| apply(once.clone(), var(w))),
            )
        })
    });
    check(&term, "(\u{3bb} (\u{3bb} (1 0)))");
}

// Lévy/Lamping's own examples: a duplicator threaded through one lambda
// meets a duplicator threaded through a nested one, so the two can only
// ever annihilate if the commutation mints a deeper level crossing that
// inner binder. Exercises the oracle rule (DUP_j bowtie DUP_k, j != k)
// directly, rather than just an efficiency difference in the result.

fn lamping_example() -> Rc<Term> {
    apply(
        lam(|g| apply(var(g), apply(var(g), lam(|x| var(x))))),
        lam(|h| {
            apply(
                lam(|f| apply(var(f), apply(var(f), lam(|z| var(z))))),
                lam(|w| apply(var(h), apply(var(w), lam(|y| var(y))))),
            )
        }),
    )
}

#[test]
fn lamping_example_reduces_to_identity() {
    check(&lamping_example(), "(\u{3bb} 0)");
}

fn lamping_example_2() -> Rc<Term> {
    apply(
        lam(|g| apply(var(g), apply(var(g), lam(|x| var(x))))),
        lam(|h| {
            apply(
                lam(|f| apply(var(f), apply(var(f), lam(|z| var(z))))),
                apply(var(h), lam(|y| var(y))),
            )
        }),
    )
}

#[test]
fn lamping_example_2_reduces_to_identity() {
    check(&lamping_example_2(), "(\u{3bb} 0)");
}

fn asperti_guerrini_example() -> Rc<Term> {
    let once = lam(|v| var(v));
    let twice = lam(|w| apply(var(w), var(w)));
    lam(|z| {
        apply(
            lam(|x| apply(var(x), once)),
            lam(|y| apply(twice, apply(var(y), var(z)))),
        )
    })
}

#[test]
fn asperti_guerrini_example_reduces_to_a_self_application() {
    check(&asperti_guerrini_example(), "(\u{3bb} (0 0))");
}
